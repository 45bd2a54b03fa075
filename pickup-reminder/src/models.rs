use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDateTime, Utc};
use pickup_shared::Masked;
use std::time::Duration;
use crate::ReminderError;

pub const DEFAULT_LEAD_MINUTES: f64 = 15.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    Scheduled,
    Fired,
    Cancelled,
}

impl ReminderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReminderStatus::Scheduled)
    }
}

/// A one-shot "time to leave" alert.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub id: String,
    pub departure_time: DateTime<Utc>,
    pub lead_minutes: f64,
    /// Always `departure_time - lead_minutes`.
    pub alert_at: DateTime<Utc>,
    pub channel_address: Masked<String>,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    /// When the reminder left `Scheduled`; drives eviction.
    pub settled_at: Option<DateTime<Utc>>,
}

impl Reminder {
    pub fn new(
        departure_time: DateTime<Utc>,
        lead_minutes: f64,
        channel_address: String,
    ) -> Result<Self, ReminderError> {
        let alert_at = departure_time
            .checked_sub_signed(pickup_core::departure::minutes(lead_minutes))
            .ok_or_else(|| {
                ReminderError::SchedulingFault(format!(
                    "Alert time out of range: {} minutes before {}",
                    lead_minutes, departure_time
                ))
            })?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            departure_time,
            lead_minutes,
            alert_at,
            channel_address: Masked(channel_address),
            status: ReminderStatus::Scheduled,
            created_at: Utc::now(),
            settled_at: None,
        })
    }

    pub fn is_fired(&self) -> bool {
        self.status == ReminderStatus::Fired
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.alert_at
    }

    pub fn notification_message(&self) -> String {
        format!(
            "Time to leave for airport pickup! Departure time: {}",
            self.departure_time.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub default_lead_minutes: f64,
    pub max_entries: usize,
    /// How long fired or cancelled reminders stay visible before eviction
    pub retention: Duration,
    pub sweep_interval: Duration,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            default_lead_minutes: DEFAULT_LEAD_MINUTES,
            max_entries: 10_000,
            retention: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Accepts RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS[.f]]` read as UTC.
pub fn parse_departure_time(raw: &str) -> Result<DateTime<Utc>, ReminderError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ReminderError::SchedulingFault(format!("Invalid departure time: {:?}", raw)))
}
