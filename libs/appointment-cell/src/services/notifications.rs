use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::Appointment;

/// Best-effort delivery to the notification endpoint. Failures are logged
/// and swallowed; a booking never fails or rolls back because a
/// notification could not be sent.
pub struct NotificationService {
    client: Client,
    endpoint: Option<String>,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        let endpoint = if config.notifications_configured() {
            Some(config.notification_url.clone())
        } else {
            None
        };

        Self {
            client: Client::new(),
            endpoint,
        }
    }

    pub fn notify_booked(&self, appointment: &Appointment) {
        self.deliver("appointment_booked", appointment);
    }

    pub fn notify_status_changed(&self, appointment: &Appointment) {
        self.deliver("appointment_status_changed", appointment);
    }

    fn deliver(&self, event: &str, appointment: &Appointment) {
        let endpoint = match &self.endpoint {
            Some(url) => url.clone(),
            None => {
                debug!("Notification endpoint not configured, skipping {}", event);
                return;
            }
        };

        let client = self.client.clone();
        let payload = json!({
            "event": event,
            "appointment_id": appointment.id,
            "patient_id": appointment.patient_id,
            "doctor_id": appointment.doctor_id,
            "scheduled_at": appointment.scheduled_at,
            "status": appointment.status,
        });
        let event = event.to_string();

        tokio::spawn(async move {
            match client.post(&endpoint).json(&payload).send().await {
                Ok(response) if !response.status().is_success() => {
                    warn!("Notification '{}' rejected with status {}", event, response.status());
                }
                Ok(_) => debug!("Notification '{}' delivered", event),
                Err(e) => warn!("Failed to deliver notification '{}': {}", event, e),
            }
        });
    }
}
