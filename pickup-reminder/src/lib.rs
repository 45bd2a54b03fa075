pub mod models;
pub mod scheduler;

pub use models::{Reminder, ReminderStatus, ReminderSettings, parse_departure_time};
pub use scheduler::{ReminderScheduler, FireOutcome};

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    SchedulingFault(String),

    #[error("Reminder not found: {0}")]
    NotFound(String),

    #[error("Reminder already settled: {0}")]
    AlreadySettled(String),

    #[error("reminder registry is full")]
    RegistryFull,
}
