// Standard library
use std::sync::Arc;

// 3rd party crates
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::trace;

// Current module imports
use super::errors::IpDetectionError;
use super::traits::IpFetcher;
use super::types::{FetchOutcome, FetchRequest};

/// Runs one fetch until it finishes or the race broadcasts a winner,
/// whichever comes first. Cancelling drops the in-flight request.
pub async fn fetch_until_cancelled(
    fetcher: Arc<dyn IpFetcher>,
    request: FetchRequest,
    mut cancel_rx: broadcast::Receiver<()>,
) -> FetchOutcome {
    let started = Instant::now();
    let endpoint = request.endpoint.clone();

    tokio::select! {
        biased;

        outcome = fetcher.fetch(request) => outcome,
        _ = cancel_rx.recv() => {
            trace!("Cancelled request to {}", endpoint);
            FetchOutcome::failure(IpDetectionError::Cancelled { endpoint }, started.elapsed())
        }
    }
}

/// Prefixes `http://` to endpoints given without a scheme.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::utility::ip_detector::types::IpVersion;

    struct Stalled;

    #[async_trait]
    impl IpFetcher for Stalled {
        async fn fetch(&self, _request: FetchRequest) -> FetchOutcome {
            tokio::time::sleep(Duration::from_secs(30)).await;
            FetchOutcome {
                result: Ok("192.0.2.1".to_string()),
                elapsed: Duration::from_secs(30),
            }
        }
    }

    fn request() -> FetchRequest {
        FetchRequest {
            endpoint: "http://stalled".to_string(),
            ip_version: IpVersion::V4,
            bind: None,
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn test_cancel_signal_aborts_fetch() {
        let (cancel_tx, cancel_rx) = broadcast::channel(1);
        let task = tokio::spawn(fetch_until_cancelled(Arc::new(Stalled), request(), cancel_rx));

        cancel_tx.send(()).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(
            outcome.result,
            Err(IpDetectionError::Cancelled { ref endpoint }) if endpoint == "http://stalled"
        ));
        assert!(!outcome.is_timeout());
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("icanhazip.com"), "http://icanhazip.com");
        assert_eq!(normalize_endpoint("http://a.example"), "http://a.example");
        assert_eq!(normalize_endpoint("https://a.example/ip"), "https://a.example/ip");
    }
}
