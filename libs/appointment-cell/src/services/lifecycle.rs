use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current_status, new_status);

        if !self.valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::InProgress => vec![AppointmentStatus::Completed],
            // Terminal states
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends a note to the appointment's notes log. Earlier entries are kept;
/// each new entry is prefixed with the status and the moment it was recorded.
pub fn append_status_note(
    existing: Option<&str>,
    status: AppointmentStatus,
    note: &str,
    at: DateTime<Utc>,
) -> String {
    let entry = format!(
        "[{} {}] {}",
        status.to_string().to_uppercase(),
        at.format("%Y-%m-%d %H:%M"),
        note.trim()
    );

    match existing {
        Some(prior) if !prior.trim().is_empty() => format!("{}\n{}", prior, entry),
        _ => entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn happy_path_transitions_are_allowed() {
        let service = AppointmentLifecycleService::new();

        let path = [
            (AppointmentStatus::Pending, AppointmentStatus::Confirmed),
            (AppointmentStatus::Confirmed, AppointmentStatus::InProgress),
            (AppointmentStatus::InProgress, AppointmentStatus::Completed),
        ];
        for (from, to) in path {
            assert!(service.validate_status_transition(from, to).is_ok());
        }
    }

    #[test]
    fn cancellation_allowed_before_start_only() {
        let service = AppointmentLifecycleService::new();

        assert!(service
            .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Cancelled)
            .is_ok());
        assert!(service
            .validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::NoShow)
            .is_ok());
        assert!(service
            .validate_status_transition(AppointmentStatus::InProgress, AppointmentStatus::Cancelled)
            .is_err());
    }

    #[test]
    fn terminal_states_allow_nothing() {
        let service = AppointmentLifecycleService::new();

        for terminal in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert!(service.valid_transitions(terminal).is_empty());
            let err = service
                .validate_status_transition(terminal, AppointmentStatus::Confirmed)
                .unwrap_err();
            assert_matches!(err, AppointmentError::InvalidStatusTransition { .. });
        }
    }

    #[test]
    fn notes_are_appended_not_overwritten() {
        let at = chrono::NaiveDate::from_ymd_opt(2026, 9, 14)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();

        let first = append_status_note(None, AppointmentStatus::Confirmed, "patient called", at);
        assert_eq!(first, "[CONFIRMED 2026-09-14 10:00] patient called");

        let second = append_status_note(
            Some(&first),
            AppointmentStatus::Cancelled,
            "family emergency",
            at,
        );
        assert!(second.starts_with(&first));
        assert!(second.ends_with("[CANCELLED 2026-09-14 10:00] family emergency"));
    }
}
