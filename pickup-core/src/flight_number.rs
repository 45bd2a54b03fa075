use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};
use crate::providers::AdvisoryService;

static CANONICAL: OnceLock<Regex> = OnceLock::new();

fn canonical() -> &'static Regex {
    CANONICAL.get_or_init(|| Regex::new(r"^[A-Z]{2,3}[0-9]{3,4}$").expect("static pattern"))
}

/// Two or three uppercase carrier letters followed by three or four digits.
pub fn is_canonical(candidate: &str) -> bool {
    canonical().is_match(candidate)
}

/// Resolve free-form input to a canonical flight number.
///
/// Canonical input is returned verbatim without touching the advisory service.
/// Anything else is handed to the service for extraction; `None` means no flight
/// number could be found, which callers report as bad input.
pub async fn normalize(raw: &str, advisory: &dyn AdvisoryService) -> Option<String> {
    if is_canonical(raw) {
        return Some(raw.to_string());
    }

    match advisory.extract_flight_number(raw).await {
        Ok(Some(extracted)) => {
            let extracted = extracted.trim();
            if is_canonical(extracted) {
                debug!("Extracted flight number {} from free text", extracted);
                Some(extracted.to_string())
            } else {
                warn!("Discarding non-canonical extraction result: {:?}", extracted);
                None
            }
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Flight number extraction failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrivingEstimate, FlightSnapshot};
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedExtractor {
        reply: Result<Option<String>, ProviderError>,
        calls: AtomicUsize,
    }

    impl ScriptedExtractor {
        fn new(reply: Result<Option<String>, ProviderError>) -> Self {
            Self { reply, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl AdvisoryService for ScriptedExtractor {
        async fn extract_flight_number(&self, _text: &str) -> Result<Option<String>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }

        async fn advise(
            &self,
            _flight: &FlightSnapshot,
            _driving: &DrivingEstimate,
            _departure_time: DateTime<Utc>,
        ) -> Result<String, ProviderError> {
            unreachable!("normalizer never asks for advice")
        }
    }

    #[test]
    fn test_canonical_pattern() {
        assert!(is_canonical("AA1234"));
        assert!(is_canonical("UA456"));
        assert!(is_canonical("EZY1234"));
        assert!(!is_canonical("aa1234"));
        assert!(!is_canonical("A1234"));
        assert!(!is_canonical("AA12"));
        assert!(!is_canonical("AA12345"));
        assert!(!is_canonical(" AA1234"));
    }

    #[tokio::test]
    async fn test_canonical_input_skips_extraction() {
        let extractor = ScriptedExtractor::new(Ok(Some("XX999".to_string())));
        let result = normalize("AA1234", &extractor).await;

        assert_eq!(result.as_deref(), Some("AA1234"));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_free_text_delegates_to_extraction() {
        let extractor = ScriptedExtractor::new(Ok(Some("UA456".to_string())));
        let result = normalize("my flight is United 456 tomorrow", &extractor).await;

        assert_eq!(result.as_deref(), Some("UA456"));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sentinel_and_failure_are_not_found() {
        let extractor = ScriptedExtractor::new(Ok(None));
        assert!(normalize("no flight here", &extractor).await.is_none());

        let extractor = ScriptedExtractor::new(Err(ProviderError::Transport("timeout".to_string())));
        assert!(normalize("United 456", &extractor).await.is_none());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chatty_extraction_is_rejected() {
        let extractor = ScriptedExtractor::new(Ok(Some("The flight is UA456".to_string())));
        assert!(normalize("United 456", &extractor).await.is_none());

        let extractor = ScriptedExtractor::new(Ok(Some(" UA456\n".to_string())));
        assert_eq!(normalize("United 456", &extractor).await.as_deref(), Some("UA456"));
    }
}
