use async_trait::async_trait;
use pickup_core::{Notifier, ProviderError};
use pickup_shared::Masked;
use tracing::info;

/// Emits reminders to the process log. Stand-in for an SMS gateway.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, channel_address: &str, message: &str) -> Result<(), ProviderError> {
        info!(target: "pickup_store::delivery", "REMINDER for {}: {}", Masked(channel_address), message);
        Ok(())
    }
}
