// Standard library
use std::time::Duration;

// Project imports
use crate::utility::ip_detector::types::{CombinedReport, FamilyReport};

/// `<family>: <address>` or the failure description for one family.
pub fn family_line(report: &FamilyReport, verbose: bool) -> String {
    let ip_version = report.ip_version;

    let value = match &report.address {
        Ok(address) => address.clone(),
        Err(error) => {
            let mut output = format!("failed to get {} address", ip_version);
            if error.all_timeout {
                output.push_str(": timeout");
            }
            if verbose {
                output.push_str(": ");
                output.push_str(&error.to_string());
            }
            output
        }
    };

    format!("{}: {}", ip_version, value)
}

pub fn query_time_line(elapsed: Duration) -> String {
    format!("Query time: {} ms", elapsed.as_millis())
}

/// Terse output: the address alone, empty when the race failed.
pub fn render_short(report: &FamilyReport) -> String {
    report.address.as_deref().unwrap_or_default().to_string()
}

pub fn render_single(report: &FamilyReport, verbose: bool) -> String {
    format!(
        "{}\n{}",
        family_line(report, verbose),
        query_time_line(report.elapsed)
    )
}

pub fn render_combined(report: &CombinedReport, verbose: bool) -> String {
    format!(
        "{}\n{}\n{}",
        family_line(&report.v4, verbose),
        family_line(&report.v6, verbose),
        query_time_line(report.elapsed)
    )
}
