pub mod models;
pub mod departure;
pub mod flight_number;
pub mod providers;
pub mod planner;

pub use models::{FlightSnapshot, FlightStatus, DrivingEstimate, PickupPlan};
pub use planner::{PickupPlanner, PlanRequest};
pub use providers::{FlightDataProvider, TrafficProvider, AdvisoryService, Notifier, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    UpstreamUnavailable(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
