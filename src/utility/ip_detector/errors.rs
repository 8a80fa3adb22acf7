// 3rd party crates
use thiserror::Error;

// Current module imports
use super::constants::REASON_SEPARATOR;
use super::types::IpVersion;

/// Failure of a single endpoint query.
#[derive(Debug, Error)]
pub enum IpDetectionError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("{0}")]
    Network(#[source] reqwest::Error),

    #[error("invalid endpoint URL {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("{endpoint} is not reachable over {ip_version}")]
    FamilyUnreachable {
        endpoint: String,
        ip_version: IpVersion,
    },

    #[error("response IP not correct")]
    ResponseMismatch,

    #[error("request to {endpoint} cancelled")]
    Cancelled { endpoint: String },

    #[error("fetch task failed: {0}")]
    Task(String),
}

impl IpDetectionError {
    /// Whether the per-fetch deadline was the proximate cause.
    pub fn is_timeout(&self) -> bool {
        matches!(self, IpDetectionError::Timeout { .. })
    }
}

/// Aggregate failure of every endpoint in one family race.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .reasons.join(REASON_SEPARATOR))]
pub struct RaceError {
    /// Individual failure messages, in arrival order.
    pub reasons: Vec<String>,
    /// True only when every endpoint timed out.
    pub all_timeout: bool,
}
