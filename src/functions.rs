// 3rd party crates
use tracing::{debug, warn};

// Project imports
use crate::errors::WutError;
use crate::report::functions::{render_combined, render_short, render_single};
use crate::settings::types::Options;
use crate::utility::bind::functions::{resolve_bind, resolve_bind_pair};
use crate::utility::ip_detector::types::{BindAddresses, IpDetector};

/// Runs one lookup and renders its report.
///
/// Bind targets are resolved before racing starts, so an unknown interface
/// aborts without partial output. When both families are raced, an
/// interface lacking one family only fails that family. Endpoint failures
/// never abort; they end up in the report.
pub async fn run(options: &Options, detector: &IpDetector) -> Result<String, WutError> {
    match options.ip_version {
        Some(ip_version) => {
            let bind = resolve_bind(&options.bind, ip_version)?;
            debug!("Querying {} only", ip_version);

            let report = detector.detect(ip_version, bind).await;

            if options.short {
                if let Err(e) = &report.address {
                    warn!("failed to get {} address: {}", ip_version, e);
                }
                Ok(render_short(&report))
            } else {
                Ok(render_single(&report, options.verbose))
            }
        }
        None => {
            let binds = resolve_bind_pair(&options.bind)?;
            Ok(run_both(options, detector, binds).await)
        }
    }
}

async fn run_both(options: &Options, detector: &IpDetector, binds: BindAddresses) -> String {
    debug!("Querying IPv4 and IPv6 (binds: {:?})", binds);

    let report = detector.detect_both(binds).await;
    render_combined(&report, options.verbose)
}
