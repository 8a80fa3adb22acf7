// Standard library
use std::time::Duration;

// 3rd party crates
use clap::Parser;
use serde::Deserialize;

// Project imports
use crate::utility::bind::types::BindTarget;
use crate::utility::ip_detector::types::IpVersion;

use super::constants::DEFAULT_LOG_LEVEL;

/// Command line flags.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "wut", about = "Find out your public IPv4 and IPv6 addresses")]
pub struct Cli {
    /// use IPv4
    #[arg(short = '4', long)]
    pub ipv4: bool,

    /// use IPv6
    #[arg(short = '6', long)]
    pub ipv6: bool,

    /// use both IPv4 and IPv6
    #[arg(short, long)]
    pub both: bool,

    /// print short output with specified IP version
    #[arg(short, long)]
    pub short: bool,

    /// address or interface to bind to
    #[arg(
        short,
        long,
        value_name = "ADDR|IFACE",
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    pub interface: Option<String>,

    /// provide an API to query (can be used multiple times)
    #[arg(
        short = 'a',
        long = "api",
        value_name = "URL",
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    pub apis: Vec<String>,

    /// provide an API fetch timeout in seconds
    #[arg(short, long, value_name = "SECONDS", allow_hyphen_values = true)]
    pub timeout: Option<String>,

    /// print full error output
    #[arg(long)]
    pub verbose: bool,

    /// print `wut` version
    #[arg(short = 'v', long)]
    pub version: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Settings read from the optional config file and `WUT_*` variables.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub log: Log,
    /// Family used when none is requested on the command line.
    #[serde(default)]
    pub default_ip_version: Option<String>,
    #[serde(default)]
    pub apis: Vec<String>,
    /// Seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Fully resolved options of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// `None` races both families.
    pub ip_version: Option<IpVersion>,
    pub bind: BindTarget,
    pub short: bool,
    pub verbose: bool,
    /// Print the version instead of querying; only honoured once the other
    /// options are valid.
    pub version: bool,
    pub apis: Vec<String>,
    pub timeout: Duration,
}
