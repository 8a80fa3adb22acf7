// Standard library
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

// Project imports
use super::errors::{IpDetectionError, RaceError};
use super::traits::IpFetcher;

/// Address family of a public IP lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

/// Races every configured endpoint for one family and returns the first
/// valid answer.
#[derive(Clone)]
pub struct IpDetector {
    pub fetcher: Arc<dyn IpFetcher>,
    pub endpoints: Arc<[String]>,
    pub timeout: Duration,
}

/// A single endpoint query as handed to an [`IpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub endpoint: String,
    pub ip_version: IpVersion,
    pub bind: Option<IpAddr>,
    pub timeout: Duration,
}

/// Result of querying one endpoint.
#[derive(Debug)]
pub struct FetchOutcome {
    pub result: Result<String, IpDetectionError>,
    pub elapsed: Duration,
}

/// Consensus of one family race.
///
/// `address` holds the first validated answer, or the aggregate failure of
/// every endpoint. `elapsed` is the winner's latency, or the longest latency
/// observed when nothing succeeded.
#[derive(Debug)]
pub struct FamilyReport {
    pub ip_version: IpVersion,
    pub address: Result<String, RaceError>,
    pub elapsed: Duration,
}

/// Both family reports of an unpinned lookup.
#[derive(Debug)]
pub struct CombinedReport {
    pub v4: FamilyReport,
    pub v6: FamilyReport,
    pub elapsed: Duration,
}

/// Local source of one family in a dual-family race.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FamilyBind {
    /// Let the OS pick the source address.
    #[default]
    Any,
    Address(IpAddr),
    /// The family cannot be raced from the bind target; the reason becomes
    /// that family's failure.
    Unavailable(String),
}

/// Local source addresses for a dual-family race, one per family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindAddresses {
    pub v4: FamilyBind,
    pub v6: FamilyBind,
}

/// DNS resolver that only yields addresses of one family, so connections
/// are established exclusively over that family.
#[derive(Debug, Clone, Copy)]
pub struct FamilyResolver {
    pub ip_version: IpVersion,
}

/// Fetches the caller's address from an HTTP endpoint with reqwest.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;
