// 3rd party crates
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid log level: {0}. Must be one of: error, warn, info, debug, trace")]
    InvalidLogLevel(String),
    #[error("`timeout` argument not an integer")]
    TimeoutNotInteger,
    #[error("`timeout` must be greater than or equal to 1")]
    TimeoutTooSmall,
    #[error("conflicting IP versions")]
    ConflictingIpVersions,
    #[error("short output option also requires IP version to be specified")]
    ShortWithoutIpVersion,
}
