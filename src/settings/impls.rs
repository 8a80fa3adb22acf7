// Standard library
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

// 3rd party crates
use config::{Config, ConfigError, Environment, File};
use tracing::debug;

// Project imports
use crate::errors::WutError;
use crate::utility::bind::functions::classify;
use crate::utility::ip_detector::constants::{DEFAULT_APIS, DEFAULT_TIMEOUT_SECS};
use crate::utility::ip_detector::functions::normalize_endpoint;
use crate::utility::ip_detector::types::IpVersion;

// Current module imports
use super::constants::{CONFIG_PATH_ENV, ENV_PREFIX, LOG_LEVELS};
use super::errors::ValidationError;
use super::types::{Cli, Options, Settings};

impl Settings {
    /// Loads and validates settings from the default locations.
    pub fn load() -> Result<Self, WutError> {
        let config_path: Option<PathBuf> = Self::get_config_path();
        let settings: Settings = Self::load_from(config_path.as_deref())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Determines the configuration file path.
    fn get_config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            Some(PathBuf::from(path))
        } else {
            dirs::config_dir().map(|config_dir| config_dir.join("wut").join("config.toml"))
        }
    }

    /// Loads the settings from an optional file and `WUT_*` environment variables.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            debug!("Reading configuration from {:?}", path);
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: Config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("apis"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_log_level(&self) -> String {
        self.log.level.to_lowercase()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !LOG_LEVELS.contains(&self.get_log_level().as_str()) {
            return Err(ValidationError::InvalidLogLevel(self.log.level.clone()));
        }

        if self.timeout == Some(0) {
            return Err(ValidationError::TimeoutTooSmall);
        }

        Ok(())
    }

    /// The configured default family; unknown values are ignored.
    pub fn get_default_ip_version(&self) -> Option<IpVersion> {
        match self.default_ip_version.as_deref().map(str::trim) {
            Some("ipv4") | Some("4") => Some(IpVersion::V4),
            Some("ipv6") | Some("6") => Some(IpVersion::V6),
            _ => None,
        }
    }
}

impl Options {
    /// Combines command line flags with settings.
    pub fn resolve(cli: &Cli, settings: &Settings) -> Result<Self, ValidationError> {
        let bind = classify(cli.interface.as_deref().unwrap_or_default());
        let mut ip_version = bind.ip_version;

        let mut requested = 0;
        if cli.ipv4 {
            if ip_version == Some(IpVersion::V6) {
                return Err(ValidationError::ConflictingIpVersions);
            }
            ip_version = Some(IpVersion::V4);
            requested += 1;
        }
        if cli.ipv6 {
            if ip_version == Some(IpVersion::V4) {
                return Err(ValidationError::ConflictingIpVersions);
            }
            ip_version = Some(IpVersion::V6);
            requested += 1;
        }
        if cli.both {
            requested += 1;
        }
        if requested > 1 {
            return Err(ValidationError::ConflictingIpVersions);
        }

        if ip_version.is_none() && !cli.both {
            ip_version = settings.get_default_ip_version();
        }

        if cli.short && ip_version.is_none() {
            return Err(ValidationError::ShortWithoutIpVersion);
        }

        let apis: Vec<String> = if !cli.apis.is_empty() {
            cli.apis.iter().map(|api| normalize_endpoint(api)).collect()
        } else if !settings.apis.is_empty() {
            settings.apis.iter().map(|api| normalize_endpoint(api)).collect()
        } else {
            DEFAULT_APIS.iter().map(|api| api.to_string()).collect()
        };

        let timeout_secs: u64 = match cli.timeout.as_deref() {
            Some(raw) => {
                let secs: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ValidationError::TimeoutNotInteger)?;
                if secs < 1 {
                    return Err(ValidationError::TimeoutTooSmall);
                }
                secs as u64
            }
            None => settings.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Options {
            ip_version,
            bind,
            short: cli.short,
            verbose: cli.verbose,
            version: cli.version,
            apis,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
