use serde::{Deserialize, Serialize};
use chrono::{DateTime, FixedOffset, Utc};

/// Operational status reported by the flight-data provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Scheduled,
    Active,
    Landed,
    Cancelled,
    Diverted,
    #[serde(other)]
    Unknown,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "scheduled",
            FlightStatus::Active => "active",
            FlightStatus::Landed => "landed",
            FlightStatus::Cancelled => "cancelled",
            FlightStatus::Diverted => "diverted",
            FlightStatus::Unknown => "unknown",
        }
    }
}

/// Point-in-time view of one flight's arrival, produced per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightSnapshot {
    pub flight_iata: String,
    pub airline: Option<String>,
    pub scheduled_arrival: DateTime<FixedOffset>,
    pub estimated_arrival: Option<DateTime<FixedOffset>>,
    pub arrival_airport: Option<String>,
    pub gate: Option<String>,
    pub terminal: Option<String>,
    pub status: FlightStatus,
}

/// Driving time and distance between two places.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrivingEstimate {
    /// Traffic-adjusted when the provider has live data, free-flow otherwise.
    pub duration_seconds: f64,
    pub distance_text: String,
    pub distance_meters: f64,
}

impl DrivingEstimate {
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }

    pub fn rounded_minutes(&self) -> i64 {
        self.duration_minutes().round() as i64
    }
}

/// Result of one successful pickup planning run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PickupPlan {
    pub flight_number: String,
    pub flight: FlightSnapshot,
    pub driving: DrivingEstimate,
    pub departure_time: DateTime<Utc>,
    pub advice: String,
}
