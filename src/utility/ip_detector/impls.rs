// Standard library
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

// 3rd party crates
use async_trait::async_trait;
use futures::{stream::FuturesUnordered, StreamExt};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{Client, Url};
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

// Current module imports
use super::errors::{IpDetectionError, RaceError};
use super::functions::fetch_until_cancelled;
use super::traits::IpFetcher;
use super::types::{
    BindAddresses, CombinedReport, FamilyBind, FamilyReport, FamilyResolver, FetchOutcome,
    FetchRequest, HttpFetcher, IpDetector, IpVersion,
};

impl IpVersion {
    /// Family of an address. IPv4-mapped IPv6 literals stay IPv6.
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    pub fn matches(&self, ip: &IpAddr) -> bool {
        Self::of(ip) == *self
    }

    pub fn label(&self) -> &'static str {
        match self {
            IpVersion::V4 => "IPv4",
            IpVersion::V6 => "IPv6",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FetchOutcome {
    pub fn failure(error: IpDetectionError, elapsed: Duration) -> Self {
        Self {
            result: Err(error),
            elapsed,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(&self.result, Err(e) if e.is_timeout())
    }
}

impl FamilyReport {
    /// A failed race is a timeout only if every endpoint timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(&self.address, Err(e) if e.all_timeout)
    }

    /// Report for a family that could not be raced at all.
    pub fn unavailable(ip_version: IpVersion, reason: String) -> Self {
        FamilyReport {
            ip_version,
            address: Err(RaceError {
                reasons: vec![reason],
                all_timeout: false,
            }),
            elapsed: Duration::ZERO,
        }
    }

    fn from_join(ip_version: IpVersion, joined: Result<FamilyReport, JoinError>) -> Self {
        joined.unwrap_or_else(|e| {
            warn!("🧩 {} race task failed: {}", ip_version, e);
            FamilyReport {
                ip_version,
                address: Err(RaceError {
                    reasons: vec![format!("race task failed: {}", e)],
                    all_timeout: false,
                }),
                elapsed: Duration::ZERO,
            }
        })
    }
}

impl CombinedReport {
    /// Merges two family reports.
    ///
    /// A timed-out race only reports the timeout ceiling, so when exactly one
    /// family timed out the other family's latency is used.
    pub fn new(v4: FamilyReport, v6: FamilyReport) -> Self {
        let elapsed = match (v4.is_timeout(), v6.is_timeout()) {
            (true, false) => v6.elapsed,
            (false, true) => v4.elapsed,
            _ => v4.elapsed.max(v6.elapsed),
        };

        Self { v4, v6, elapsed }
    }
}

impl IpDetector {
    pub fn new(fetcher: Arc<dyn IpFetcher>, endpoints: Vec<String>, timeout: Duration) -> Self {
        Self {
            fetcher,
            endpoints: endpoints.into(),
            timeout,
        }
    }

    /// Detector backed by real HTTP requests.
    pub fn http(endpoints: Vec<String>, timeout: Duration) -> Self {
        Self::new(Arc::new(HttpFetcher), endpoints, timeout)
    }

    /// Races every endpoint for one family.
    ///
    /// The first valid answer wins and cancels the remaining requests. Every
    /// spawned fetch is joined before this returns.
    pub async fn detect(&self, ip_version: IpVersion, bind: Option<IpAddr>) -> FamilyReport {
        if self.endpoints.is_empty() {
            return FamilyReport {
                ip_version,
                address: Err(RaceError {
                    reasons: vec!["no endpoints configured".to_string()],
                    all_timeout: false,
                }),
                elapsed: Duration::ZERO,
            };
        }

        debug!(
            "Racing {} endpoints for {} (bind: {:?}, timeout: {:?})",
            self.endpoints.len(),
            ip_version,
            bind,
            self.timeout
        );

        let (cancel_tx, _) = broadcast::channel::<()>(1);

        let mut tasks: FuturesUnordered<JoinHandle<FetchOutcome>> = self
            .endpoints
            .iter()
            .map(|endpoint| {
                let request = FetchRequest {
                    endpoint: endpoint.clone(),
                    ip_version,
                    bind,
                    timeout: self.timeout,
                };
                tokio::spawn(fetch_until_cancelled(
                    Arc::clone(&self.fetcher),
                    request,
                    cancel_tx.subscribe(),
                ))
            })
            .collect();

        let mut winner: Option<(String, Duration)> = None;
        let mut reasons: Vec<String> = Vec::with_capacity(self.endpoints.len());
        let mut all_timeout = true;
        let mut longest = Duration::ZERO;

        while let Some(joined) = tasks.next().await {
            let outcome = joined.unwrap_or_else(|e| {
                FetchOutcome::failure(IpDetectionError::Task(e.to_string()), Duration::ZERO)
            });

            if winner.is_some() {
                trace!("Drained {} outcome after winner", ip_version);
                continue;
            }

            longest = longest.max(outcome.elapsed);

            match outcome.result {
                Ok(address) => {
                    info!(
                        "Public 🧩 {} detected: {} ({} ms)",
                        ip_version,
                        address,
                        outcome.elapsed.as_millis()
                    );
                    winner = Some((address, outcome.elapsed));
                    // Err only when every fetch already finished.
                    let _ = cancel_tx.send(());
                }
                Err(e) => {
                    debug!("🧩 {} endpoint failed: {}", ip_version, e);
                    all_timeout &= e.is_timeout();
                    reasons.push(e.to_string());
                }
            }
        }

        match winner {
            Some((address, elapsed)) => FamilyReport {
                ip_version,
                address: Ok(address),
                elapsed,
            },
            None => {
                let error = RaceError {
                    reasons,
                    all_timeout,
                };
                warn!("🧩 {} detection failed: {}", ip_version, error);
                FamilyReport {
                    ip_version,
                    address: Err(error),
                    elapsed: longest,
                }
            }
        }
    }

    /// Races one family from `bind`, or reports it failed when the bind
    /// target has nothing for it.
    pub async fn detect_bound(&self, ip_version: IpVersion, bind: FamilyBind) -> FamilyReport {
        match bind {
            FamilyBind::Any => self.detect(ip_version, None).await,
            FamilyBind::Address(ip) => self.detect(ip_version, Some(ip)).await,
            FamilyBind::Unavailable(reason) => {
                info!("🧩 Skipping {} race: {}", ip_version, reason);
                FamilyReport::unavailable(ip_version, reason)
            }
        }
    }

    /// Races IPv4 and IPv6 independently; a winner in one family never
    /// cancels the other.
    pub async fn detect_both(&self, binds: BindAddresses) -> CombinedReport {
        let BindAddresses { v4, v6 } = binds;

        let v4 = tokio::spawn({
            let detector = self.clone();
            async move { detector.detect_bound(IpVersion::V4, v4).await }
        });
        let v6 = tokio::spawn({
            let detector = self.clone();
            async move { detector.detect_bound(IpVersion::V6, v6).await }
        });

        let (v4, v6) = tokio::join!(v4, v6);

        CombinedReport::new(
            FamilyReport::from_join(IpVersion::V4, v4),
            FamilyReport::from_join(IpVersion::V6, v6),
        )
    }
}

impl FamilyResolver {
    pub fn new(ip_version: IpVersion) -> Self {
        Self { ip_version }
    }
}

impl Resolve for FamilyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let ip_version = self.ip_version;
        let host = name.as_str().to_owned();

        Box::pin(async move {
            let matching: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
                .await?
                .filter(|addr| ip_version.matches(&addr.ip()))
                .collect();

            if matching.is_empty() {
                return Err(format!("no {} address found for {}", ip_version, host).into());
            }

            let addrs: Addrs = Box::new(matching.into_iter());
            Ok::<Addrs, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

impl HttpFetcher {
    /// Client scoped to one request: family-restricted resolution, optional
    /// source address and a deadline covering the whole exchange. Proxies
    /// are bypassed since they would pick the family themselves.
    fn build_client(request: &FetchRequest) -> Result<Client, IpDetectionError> {
        let mut builder = Client::builder()
            .no_proxy()
            .timeout(request.timeout)
            .dns_resolver(Arc::new(FamilyResolver::new(request.ip_version)));

        if let Some(bind) = request.bind {
            builder = builder.local_address(bind);
        }

        builder.build().map_err(IpDetectionError::ClientBuild)
    }

    fn classify(endpoint: &str, error: reqwest::Error) -> IpDetectionError {
        if error.is_timeout() {
            IpDetectionError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            IpDetectionError::Network(error)
        }
    }

    async fn query(&self, request: &FetchRequest) -> Result<String, IpDetectionError> {
        let url = Url::parse(&request.endpoint).map_err(|e| IpDetectionError::InvalidEndpoint {
            endpoint: request.endpoint.clone(),
            reason: e.to_string(),
        })?;

        // Literal hosts skip the resolver, so the family check happens here.
        if let Some(host) = url.host_str() {
            let literal = host.trim_start_matches('[').trim_end_matches(']');
            if let Ok(ip) = literal.parse::<IpAddr>() {
                if !request.ip_version.matches(&ip) {
                    return Err(IpDetectionError::FamilyUnreachable {
                        endpoint: request.endpoint.clone(),
                        ip_version: request.ip_version,
                    });
                }
            }
        }

        let client = Self::build_client(request)?;

        let body = client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::classify(&request.endpoint, e))?
            .text()
            .await
            .map_err(|e| Self::classify(&request.endpoint, e))?;

        let ip = body.trim();
        match ip.parse::<IpAddr>() {
            Ok(addr) if request.ip_version.matches(&addr) => Ok(ip.to_string()),
            _ => Err(IpDetectionError::ResponseMismatch),
        }
    }
}

#[async_trait]
impl IpFetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> FetchOutcome {
        let started = Instant::now();
        let result = self.query(&request).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(ip) => debug!("{} answered {} in {:?}", request.endpoint, ip, elapsed),
            Err(e) => debug!("{} failed after {:?}: {}", request.endpoint, elapsed, e),
        }

        FetchOutcome { result, elapsed }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Canned behaviour of one fake endpoint.
    #[derive(Clone)]
    enum Reply {
        Body(&'static str, u64),
        Timeout(u64),
        Hang,
    }

    /// Decrements the in-flight counter even when the fetch is cancelled.
    struct InFlight(Arc<AtomicUsize>);

    impl Drop for InFlight {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    struct FakeFetcher {
        replies: Vec<(&'static str, Reply)>,
        in_flight: Arc<AtomicUsize>,
        seen: Mutex<Vec<FetchRequest>>,
    }

    impl FakeFetcher {
        fn new(replies: Vec<(&'static str, Reply)>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                in_flight: Arc::new(AtomicUsize::new(0)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn endpoints(&self) -> Vec<String> {
            self.replies.iter().map(|(e, _)| e.to_string()).collect()
        }
    }

    #[async_trait]
    impl IpFetcher for FakeFetcher {
        async fn fetch(&self, request: FetchRequest) -> FetchOutcome {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let _guard = InFlight(Arc::clone(&self.in_flight));
            self.seen.lock().unwrap().push(request.clone());

            let reply = self
                .replies
                .iter()
                .find(|(e, _)| *e == request.endpoint)
                .map(|(_, r)| r.clone())
                .unwrap();

            match reply {
                Reply::Body(body, delay_ms) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    let ip = body.trim();
                    let result = match ip.parse::<IpAddr>() {
                        Ok(addr) if request.ip_version.matches(&addr) => Ok(ip.to_string()),
                        _ => Err(IpDetectionError::ResponseMismatch),
                    };
                    FetchOutcome {
                        result,
                        elapsed: Duration::from_millis(delay_ms),
                    }
                }
                Reply::Timeout(after_ms) => {
                    tokio::time::sleep(Duration::from_millis(after_ms)).await;
                    FetchOutcome::failure(
                        IpDetectionError::Timeout {
                            endpoint: request.endpoint.clone(),
                        },
                        Duration::from_millis(after_ms),
                    )
                }
                Reply::Hang => {
                    futures::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    fn detector(fetcher: &Arc<FakeFetcher>) -> IpDetector {
        IpDetector::new(
            Arc::clone(fetcher) as Arc<dyn IpFetcher>,
            fetcher.endpoints(),
            Duration::from_secs(3),
        )
    }

    fn failed(ip_version: IpVersion, all_timeout: bool, elapsed_ms: u64) -> FamilyReport {
        FamilyReport {
            ip_version,
            address: Err(RaceError {
                reasons: vec!["boom".to_string()],
                all_timeout,
            }),
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    fn succeeded(ip_version: IpVersion, elapsed_ms: u64) -> FamilyReport {
        FamilyReport {
            ip_version,
            address: Ok("192.0.2.1".to_string()),
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    #[test]
    fn test_ip_version_of_address() {
        assert_eq!(IpVersion::of(&IpAddr::V4(Ipv4Addr::LOCALHOST)), IpVersion::V4);
        assert_eq!(IpVersion::of(&IpAddr::V6(Ipv6Addr::LOCALHOST)), IpVersion::V6);
    }

    #[test]
    fn test_ipv6_body_stays_ipv6_even_if_dotted_quad_compatible() {
        for body in ["::ffff:192.0.2.1", "::192.0.2.1"] {
            let ip: IpAddr = body.parse().unwrap();
            assert!(IpVersion::V6.matches(&ip), "{}", body);
            assert!(!IpVersion::V4.matches(&ip), "{}", body);
        }
    }

    #[tokio::test]
    async fn test_dotted_quad_ipv6_body_does_not_win_ipv4_race() {
        let fetcher = FakeFetcher::new(vec![
            ("http://mapped", Reply::Body("::ffff:192.0.2.1", 5)),
            ("http://plain", Reply::Body("198.51.100.7", 40)),
        ]);

        let report = detector(&fetcher).detect(IpVersion::V4, None).await;

        assert_eq!(report.address.unwrap(), "198.51.100.7");
    }

    #[tokio::test]
    async fn test_first_valid_answer_wins() {
        let fetcher = FakeFetcher::new(vec![
            ("http://slow", Reply::Body("203.0.113.9", 400)),
            ("http://fast", Reply::Body(" 198.51.100.7\n", 10)),
        ]);

        let report = detector(&fetcher).detect(IpVersion::V4, None).await;

        assert_eq!(report.address.unwrap(), "198.51.100.7");
        assert_eq!(report.elapsed, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_wrong_family_answer_is_not_a_winner() {
        let fetcher = FakeFetcher::new(vec![
            ("http://v6", Reply::Body("2001:db8::1", 5)),
            ("http://v4", Reply::Body("198.51.100.7", 50)),
        ]);

        let report = detector(&fetcher).detect(IpVersion::V4, None).await;

        assert_eq!(report.address.unwrap(), "198.51.100.7");
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_joined_in_arrival_order() {
        let fetcher = FakeFetcher::new(vec![
            ("http://a", Reply::Body("<html>", 5)),
            ("http://b", Reply::Body("not an ip", 30)),
        ]);

        let report = detector(&fetcher).detect(IpVersion::V4, None).await;

        let error = report.address.unwrap_err();
        assert_eq!(
            error.to_string(),
            "response IP not correct | response IP not correct"
        );
        assert!(!error.all_timeout);
        assert_eq!(report.elapsed, Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_all_timeouts_mark_report_as_timeout() {
        let fetcher = FakeFetcher::new(vec![
            ("http://a", Reply::Timeout(20)),
            ("http://b", Reply::Timeout(40)),
        ]);

        let report = detector(&fetcher).detect(IpVersion::V6, None).await;

        assert!(report.is_timeout());
        assert_eq!(report.elapsed, Duration::from_millis(40));
        let error = report.address.unwrap_err();
        assert_eq!(error.reasons.len(), 2);
        assert_eq!(error.reasons[0], "request to http://a timed out");
    }

    #[tokio::test]
    async fn test_one_non_timeout_failure_clears_timeout_flag() {
        let fetcher = FakeFetcher::new(vec![
            ("http://a", Reply::Timeout(20)),
            ("http://b", Reply::Body("garbage", 5)),
        ]);

        let report = detector(&fetcher).detect(IpVersion::V4, None).await;

        assert!(!report.is_timeout());
        assert_eq!(
            report.address.unwrap_err().to_string(),
            "response IP not correct | request to http://a timed out"
        );
    }

    #[tokio::test]
    async fn test_winner_cancels_pending_fetches_without_leaking() {
        let fetcher = FakeFetcher::new(vec![
            ("http://hang-1", Reply::Hang),
            ("http://winner", Reply::Body("2001:db8::7", 10)),
            ("http://hang-2", Reply::Hang),
        ]);
        let detector = detector(&fetcher);

        for _ in 0..3 {
            let report = tokio::time::timeout(
                Duration::from_secs(2),
                detector.detect(IpVersion::V6, None),
            )
            .await
            .expect("race should finish once a winner is found");

            assert_eq!(report.address.unwrap(), "2001:db8::7");
            assert_eq!(fetcher.in_flight.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_requests_carry_family_bind_and_timeout() {
        let fetcher = FakeFetcher::new(vec![("http://a", Reply::Body("192.0.2.10", 1))]);
        let bind = Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 55)));

        detector(&fetcher).detect(IpVersion::V4, bind).await;

        let seen = fetcher.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].ip_version, IpVersion::V4);
        assert_eq!(seen[0].bind, bind);
        assert_eq!(seen[0].timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_empty_endpoint_list_reports_error() {
        let detector = IpDetector::new(FakeFetcher::new(vec![]), vec![], Duration::from_secs(1));

        let report = detector.detect(IpVersion::V4, None).await;

        assert!(!report.address.unwrap_err().to_string().is_empty());
    }

    #[tokio::test]
    async fn test_families_race_independently() {
        let fetcher = FakeFetcher::new(vec![
            ("http://v4-only", Reply::Body("198.51.100.7", 5)),
            ("http://v6-only", Reply::Body("2001:db8::1", 60)),
        ]);

        let report = detector(&fetcher)
            .detect_both(BindAddresses::default())
            .await;

        assert_eq!(report.v4.address.unwrap(), "198.51.100.7");
        assert_eq!(report.v6.address.unwrap(), "2001:db8::1");
        assert_eq!(report.elapsed, Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_unavailable_family_does_not_block_the_other() {
        let fetcher = FakeFetcher::new(vec![("http://v4-only", Reply::Body("198.51.100.7", 25))]);

        let report = detector(&fetcher)
            .detect_both(BindAddresses {
                v4: FamilyBind::Address("192.0.2.10".parse().unwrap()),
                v6: FamilyBind::Unavailable("interface eth0 does not have an IPv6 address".to_string()),
            })
            .await;

        assert_eq!(report.v4.address.unwrap(), "198.51.100.7");
        let v6 = report.v6.address.unwrap_err();
        assert!(!v6.all_timeout);
        assert_eq!(v6.to_string(), "interface eth0 does not have an IPv6 address");
        assert_eq!(report.v6.elapsed, Duration::ZERO);
        assert_eq!(report.elapsed, Duration::from_millis(25));
    }

    #[test]
    fn test_combined_elapsed_is_max_when_timeouts_match() {
        let both_ok = CombinedReport::new(succeeded(IpVersion::V4, 120), succeeded(IpVersion::V6, 80));
        assert_eq!(both_ok.elapsed, Duration::from_millis(120));

        let both_timeout = CombinedReport::new(
            failed(IpVersion::V4, true, 3000),
            failed(IpVersion::V6, true, 3001),
        );
        assert_eq!(both_timeout.elapsed, Duration::from_millis(3001));
    }

    #[test]
    fn test_combined_elapsed_skips_timed_out_family() {
        let v6_timeout = CombinedReport::new(succeeded(IpVersion::V4, 90), failed(IpVersion::V6, true, 3000));
        assert_eq!(v6_timeout.elapsed, Duration::from_millis(90));

        let v4_timeout = CombinedReport::new(failed(IpVersion::V4, true, 3000), failed(IpVersion::V6, false, 15));
        assert_eq!(v4_timeout.elapsed, Duration::from_millis(15));
    }
}
