use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::models::{DrivingEstimate, FlightSnapshot};

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ProviderError {
    #[error("No matching record: {0}")]
    NotFound(String),
    #[error("Route status {0}")]
    RouteStatus(String),
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait FlightDataProvider: Send + Sync {
    /// Look up the current arrival schedule for an IATA flight code (e.g. `AA1234`)
    async fn lookup(&self, flight_iata: &str) -> Result<FlightSnapshot, ProviderError>;
}

#[async_trait]
pub trait TrafficProvider: Send + Sync {
    /// Estimate driving time between two free-form places
    async fn estimate(&self, origin: &str, destination: &str) -> Result<DrivingEstimate, ProviderError>;
}

#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// Pull a flight number out of free text. `Ok(None)` means none was present.
    async fn extract_flight_number(&self, text: &str) -> Result<Option<String>, ProviderError>;

    /// Short, practical pickup advice for the computed plan
    async fn advise(
        &self,
        flight: &FlightSnapshot,
        driving: &DrivingEstimate,
        departure_time: DateTime<Utc>,
    ) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fire-and-forget delivery to an opaque channel address
    async fn notify(&self, channel_address: &str, message: &str) -> Result<(), ProviderError>;
}
