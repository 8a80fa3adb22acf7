/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "WUT_CONFIG_PATH";

/// Prefix of environment variables read into [`super::types::Settings`].
pub const ENV_PREFIX: &str = "WUT";

/// Quiet by default so stdout and stderr only carry the report.
pub const DEFAULT_LOG_LEVEL: &str = "error";

pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
