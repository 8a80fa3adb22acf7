//! `wut` finds the caller's public IPv4 and IPv6 addresses by racing several
//! "what is my IP" endpoints and keeping the first valid answer.

pub mod errors;
pub mod functions;
pub mod report;
pub mod settings;
pub mod utility;

/// Version reported by `--version`; `WUT_VERSION` at build time overrides it.
pub const VERSION: &str = match option_env!("WUT_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
