use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::{
    AvailabilityDecision, AvailabilityReason, AvailableSlot, ConflictingAppointment,
    DoctorError, ScheduleException, WeeklyScheduleBlock,
};

/// Everything the availability rules need to know about one doctor-day,
/// fetched once so the evaluation itself stays pure.
pub struct DaySnapshot {
    pub blocks: Vec<WeeklyScheduleBlock>,
    pub exceptions: Vec<ScheduleException>,
    pub appointments: Vec<ConflictingAppointment>,
}

fn is_blocking_status(status: &str) -> bool {
    !matches!(status, "cancelled" | "no_show")
}

/// Decides whether `when` is bookable. Checks run in a fixed order and
/// short-circuit on the first failure: past time, then working hours, then
/// date exceptions, then booking conflicts.
pub fn evaluate(when: DateTime<Utc>, now: DateTime<Utc>, snapshot: &DaySnapshot) -> AvailabilityDecision {
    if when <= now {
        return AvailabilityDecision::blocked(
            AvailabilityReason::PastDatetime,
            "Requested time is in the past",
        );
    }

    let day_of_week = when.weekday().number_from_monday() as u8;
    let time_of_day = when.time();

    // Working hours are half-open: a block covers [start_time, end_time).
    let block = snapshot.blocks.iter().find(|b| {
        b.is_active
            && b.day_of_week == day_of_week
            && b.start_time <= time_of_day
            && time_of_day < b.end_time
    });

    let block = match block {
        Some(b) => b,
        None => {
            return AvailabilityDecision::blocked(
                AvailabilityReason::NoWorkingHours,
                "Doctor has no working hours at the requested time",
            );
        }
    };

    let date = when.date_naive();
    if let Some(exception) = snapshot
        .exceptions
        .iter()
        .find(|e| e.is_active && e.date == date)
    {
        return AvailabilityDecision::blocked(
            AvailabilityReason::DoctorUnavailable,
            exception.reason.clone(),
        );
    }

    let slot_end = when + Duration::minutes(block.slot_minutes as i64);
    let conflict = snapshot.appointments.iter().find(|apt| {
        let apt_end = apt.scheduled_at + Duration::minutes(apt.duration_minutes as i64);
        is_blocking_status(&apt.status) && when < apt_end && apt.scheduled_at < slot_end
    });

    if let Some(conflict) = conflict {
        return AvailabilityDecision::taken(conflict.clone());
    }

    AvailabilityDecision::bookable(block.slot_minutes)
}

/// Steps through each block of the day and keeps the bookable instants.
/// Stateless over the snapshot, so repeated calls between writes return the
/// same list.
pub fn enumerate_slots(
    date: NaiveDate,
    now: DateTime<Utc>,
    snapshot: &DaySnapshot,
    branch_id: Option<i32>,
) -> Vec<AvailableSlot> {
    let mut slots = Vec::new();

    for block in &snapshot.blocks {
        // Rows written to the store directly can bypass write-time
        // validation; a non-positive slot length would stall the stepper.
        if !block.is_active || block.slot_minutes <= 0 {
            continue;
        }
        if let Some(branch) = branch_id {
            if block.branch_id != branch {
                continue;
            }
        }

        let block_end = date.and_time(block.end_time).and_utc();
        let mut current = date.and_time(block.start_time).and_utc();

        while current < block_end {
            let decision = evaluate(current, now, snapshot);
            if decision.bookable {
                slots.push(AvailableSlot {
                    starts_at: current,
                    duration_minutes: block.slot_minutes,
                    branch_id: block.branch_id,
                });
            }
            current += Duration::minutes(block.slot_minutes as i64);
        }
    }

    slots
}

pub struct AvailabilityService {
    db: PostgrestClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn check_availability(
        &self,
        doctor_id: Uuid,
        when: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<AvailabilityDecision, DoctorError> {
        debug!("Checking availability for doctor {} at {}", doctor_id, when);

        let snapshot = self.load_day(doctor_id, when.date_naive(), auth_token).await?;
        Ok(evaluate(when, Utc::now(), &snapshot))
    }

    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        branch_id: Option<i32>,
        auth_token: &str,
    ) -> Result<Vec<AvailableSlot>, DoctorError> {
        debug!("Enumerating slots for doctor {} on {}", doctor_id, date);

        let snapshot = self.load_day(doctor_id, date, auth_token).await?;
        let slots = enumerate_slots(date, Utc::now(), &snapshot, branch_id);

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }

    async fn load_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<DaySnapshot, DoctorError> {
        let day_of_week = date.weekday().number_from_monday();

        let blocks_path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&day_of_week=eq.{}&is_active=eq.true&order=start_time.asc",
            doctor_id, day_of_week
        );
        let blocks: Vec<WeeklyScheduleBlock> =
            self.db.request(Method::GET, &blocks_path, Some(auth_token), None).await?;

        let exceptions_path = format!(
            "/rest/v1/doctor_schedule_exceptions?doctor_id=eq.{}&date=eq.{}&is_active=eq.true",
            doctor_id, date
        );
        let exceptions: Vec<ScheduleException> =
            self.db.request(Method::GET, &exceptions_path, Some(auth_token), None).await?;

        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);
        // Timestamps use the Z suffix; a "+00:00" offset would decode as a
        // space inside the query string.
        let appointments_path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&scheduled_at=gte.{}&scheduled_at=lt.{}&status=not.in.(cancelled,no_show)&select=id,patient_id,status,scheduled_at,duration_minutes&order=scheduled_at.asc",
            doctor_id,
            day_start.to_rfc3339_opts(SecondsFormat::Secs, true),
            day_end.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let appointments: Vec<ConflictingAppointment> =
            self.db.request(Method::GET, &appointments_path, Some(auth_token), None).await?;

        Ok(DaySnapshot {
            blocks,
            exceptions,
            appointments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveTime;

    fn block(day_of_week: u8, start: &str, end: &str, slot_minutes: i32) -> WeeklyScheduleBlock {
        WeeklyScheduleBlock {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            branch_id: 1,
            day_of_week,
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            slot_minutes,
            is_active: true,
        }
    }

    fn booked(at: DateTime<Utc>, minutes: i32, status: &str) -> ConflictingAppointment {
        ConflictingAppointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            status: status.to_string(),
            scheduled_at: at,
            duration_minutes: minutes,
        }
    }

    fn empty_day(blocks: Vec<WeeklyScheduleBlock>) -> DaySnapshot {
        DaySnapshot {
            blocks,
            exceptions: vec![],
            appointments: vec![],
        }
    }

    // 2026-09-14 is a Monday.
    fn monday(time: &str) -> DateTime<Utc> {
        let t = NaiveTime::parse_from_str(time, "%H:%M").unwrap();
        NaiveDate::from_ymd_opt(2026, 9, 14).unwrap().and_time(t).and_utc()
    }

    fn now() -> DateTime<Utc> {
        monday("07:00")
    }

    #[test]
    fn past_time_is_never_bookable() {
        let snapshot = empty_day(vec![block(1, "09:00", "17:00", 30)]);
        let decision = evaluate(monday("09:00"), monday("10:00"), &snapshot);

        assert!(!decision.bookable);
        assert_matches!(decision.reason, Some(AvailabilityReason::PastDatetime));
    }

    #[test]
    fn past_check_runs_before_schedule_lookup() {
        // No blocks at all, but the past reason still wins.
        let snapshot = empty_day(vec![]);
        let decision = evaluate(monday("09:00"), monday("10:00"), &snapshot);

        assert_matches!(decision.reason, Some(AvailabilityReason::PastDatetime));
    }

    #[test]
    fn time_inside_block_is_bookable() {
        let snapshot = empty_day(vec![block(1, "09:00", "17:00", 30)]);
        let decision = evaluate(monday("09:00"), now(), &snapshot);

        assert!(decision.bookable);
        assert_eq!(decision.slot_minutes, Some(30));
    }

    #[test]
    fn block_end_time_is_not_bookable() {
        let snapshot = empty_day(vec![block(1, "09:00", "17:00", 30)]);
        let decision = evaluate(monday("17:00"), now(), &snapshot);

        assert!(!decision.bookable);
        assert_matches!(decision.reason, Some(AvailabilityReason::NoWorkingHours));
    }

    #[test]
    fn wrong_weekday_has_no_working_hours() {
        let snapshot = empty_day(vec![block(2, "09:00", "17:00", 30)]);
        let decision = evaluate(monday("10:00"), now(), &snapshot);

        assert_matches!(decision.reason, Some(AvailabilityReason::NoWorkingHours));
    }

    #[test]
    fn exception_blocks_the_whole_day() {
        let mut snapshot = empty_day(vec![block(1, "09:00", "17:00", 30)]);
        snapshot.exceptions.push(ScheduleException {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            reason: "Medical conference".to_string(),
            is_active: true,
        });

        for time in ["09:00", "12:30", "16:30"] {
            let decision = evaluate(monday(time), now(), &snapshot);
            assert_matches!(decision.reason, Some(AvailabilityReason::DoctorUnavailable));
            assert_eq!(decision.message, "Medical conference");
        }
    }

    #[test]
    fn deactivated_exception_is_ignored() {
        let mut snapshot = empty_day(vec![block(1, "09:00", "17:00", 30)]);
        snapshot.exceptions.push(ScheduleException {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            reason: "Cancelled leave".to_string(),
            is_active: false,
        });

        assert!(evaluate(monday("10:00"), now(), &snapshot).bookable);
    }

    #[test]
    fn overlapping_booking_takes_the_slot() {
        let mut snapshot = empty_day(vec![block(1, "09:00", "17:00", 30)]);
        snapshot.appointments.push(booked(monday("10:00"), 30, "confirmed"));

        // Exact instant and partial overlap both conflict.
        let exact = evaluate(monday("10:00"), now(), &snapshot);
        assert_matches!(exact.reason, Some(AvailabilityReason::SlotTaken));
        assert!(exact.conflicting.is_some());

        let partial = evaluate(monday("10:15"), now(), &snapshot);
        assert_matches!(partial.reason, Some(AvailabilityReason::SlotTaken));
    }

    #[test]
    fn adjacent_booking_does_not_conflict() {
        let mut snapshot = empty_day(vec![block(1, "09:00", "17:00", 30)]);
        snapshot.appointments.push(booked(monday("10:00"), 30, "confirmed"));

        assert!(evaluate(monday("10:30"), now(), &snapshot).bookable);
        assert!(evaluate(monday("09:30"), now(), &snapshot).bookable);
    }

    #[test]
    fn cancelled_booking_frees_the_slot() {
        let mut snapshot = empty_day(vec![block(1, "09:00", "17:00", 30)]);
        snapshot.appointments.push(booked(monday("10:00"), 30, "cancelled"));
        snapshot.appointments.push(booked(monday("11:00"), 30, "no_show"));

        assert!(evaluate(monday("10:00"), now(), &snapshot).bookable);
        assert!(evaluate(monday("11:00"), now(), &snapshot).bookable);
    }

    #[test]
    fn one_hour_block_with_half_hour_slots_yields_two() {
        let snapshot = empty_day(vec![block(1, "09:00", "10:00", 30)]);
        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

        let slots = enumerate_slots(date, now(), &snapshot, None);

        let starts: Vec<_> = slots.iter().map(|s| s.starts_at).collect();
        assert_eq!(starts, vec![monday("09:00"), monday("09:30")]);
    }

    #[test]
    fn enumeration_skips_taken_slots() {
        let mut snapshot = empty_day(vec![block(1, "09:00", "10:00", 30)]);
        snapshot.appointments.push(booked(monday("09:00"), 30, "pending"));
        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

        let slots = enumerate_slots(date, now(), &snapshot, None);

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].starts_at, monday("09:30"));
    }

    #[test]
    fn enumeration_is_idempotent() {
        let mut snapshot = empty_day(vec![
            block(1, "09:00", "12:00", 30),
            block(1, "14:00", "16:00", 20),
        ]);
        snapshot.appointments.push(booked(monday("10:00"), 30, "confirmed"));
        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

        let first = enumerate_slots(date, now(), &snapshot, None);
        let second = enumerate_slots(date, now(), &snapshot, None);

        assert_eq!(
            first.iter().map(|s| s.starts_at).collect::<Vec<_>>(),
            second.iter().map(|s| s.starts_at).collect::<Vec<_>>()
        );
    }

    #[test]
    fn non_positive_slot_length_yields_no_slots() {
        let snapshot = empty_day(vec![
            block(1, "09:00", "10:00", 0),
            block(1, "14:00", "15:00", -30),
        ]);
        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

        assert!(enumerate_slots(date, now(), &snapshot, None).is_empty());
    }

    #[test]
    fn branch_filter_limits_blocks() {
        let mut other_branch = block(1, "14:00", "16:00", 30);
        other_branch.branch_id = 2;
        let snapshot = empty_day(vec![block(1, "09:00", "10:00", 30), other_branch]);
        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();

        let slots = enumerate_slots(date, now(), &snapshot, Some(2));

        assert!(slots.iter().all(|s| s.branch_id == 2));
        assert_eq!(slots[0].starts_at, monday("14:00"));
    }
}
