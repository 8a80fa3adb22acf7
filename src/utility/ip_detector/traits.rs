// 3rd party crates
use async_trait::async_trait;

// Project imports
use super::types::{FetchOutcome, FetchRequest};

/// Capability of asking one endpoint for the caller's public address.
///
/// Implementations must be cancel-safe: the race drops the returned future
/// as soon as a sibling endpoint has answered.
#[async_trait]
pub trait IpFetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> FetchOutcome;
}
