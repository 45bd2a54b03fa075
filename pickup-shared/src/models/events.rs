use chrono::{DateTime, Utc};

/// Lifecycle notifications published by the reminder scheduler.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderEvent {
    Scheduled {
        reminder_id: String,
        departure_time: DateTime<Utc>,
        alert_at: DateTime<Utc>,
    },
    Fired {
        reminder_id: String,
        departure_time: DateTime<Utc>,
        fired_at: DateTime<Utc>,
    },
    Cancelled {
        reminder_id: String,
        cancelled_at: DateTime<Utc>,
    },
}

impl ReminderEvent {
    pub fn reminder_id(&self) -> &str {
        match self {
            ReminderEvent::Scheduled { reminder_id, .. }
            | ReminderEvent::Fired { reminder_id, .. }
            | ReminderEvent::Cancelled { reminder_id, .. } => reminder_id,
        }
    }
}
