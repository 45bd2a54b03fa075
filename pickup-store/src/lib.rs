pub mod app_config;
pub mod aviationstack;
pub mod distance_matrix;
pub mod openai;
pub mod notifier;

pub use aviationstack::AviationStackClient;
pub use distance_matrix::DistanceMatrixClient;
pub use openai::OpenAiAdvisor;
pub use notifier::LogNotifier;

pub(crate) fn transport_error(e: reqwest::Error) -> pickup_core::ProviderError {
    pickup_core::ProviderError::Transport(e.to_string())
}
