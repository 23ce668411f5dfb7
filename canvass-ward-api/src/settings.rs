use std::path::Path;
use std::time::Duration;

pub use config::{Config, ConfigError, FileFormat};
use config::builder::DefaultState;
use reqwest::Url;

use crate::list::RetryPolicy;

const DEFAULTS: &str = r#"
base_url = "http://localhost/api/"
request_timeout_ms = 12000

[retry]
max_attempts = 2
backoff_ms = 400

[cache]
ttl_ms = 120000

[auto_refresh]
interval_ms = 30000
"#;

#[derive(thiserror::Error, Debug)]
pub enum LoadSettingsError {
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),
    #[error("Configured base URL '{value}' is not valid: {cause}")]
    InvalidBaseUrl { value: String, cause: url::ParseError },
    #[error("Configured value for '{field}' is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// Client settings, merged in the following order:
/// * The built-in defaults
/// * An optional configuration file
/// * Environment variables prefixed with `CANVASS_WARD__`,
///   e.g. `CANVASS_WARD__RETRY__MAX_ATTEMPTS=3`
#[derive(Clone, Debug)]
pub struct WardSettings {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub cache_ttl: Duration,
    pub auto_refresh_interval: Duration,
}

impl WardSettings {

    pub fn load() -> Result<Self, LoadSettingsError> {
        let config = with_environment(builder()).build()?;
        Self::from_config(&config)
    }

    pub fn load_with_file(path: impl AsRef<Path>) -> Result<Self, LoadSettingsError> {
        let builder = builder()
            .add_source(config::File::from(path.as_ref()).required(false));
        let config = with_environment(builder).build()?;
        Self::from_config(&config)
    }

    fn from_config(config: &Config) -> Result<Self, LoadSettingsError> {

        let base_url = config.get_string("base_url")?;
        let base_url = Url::parse(&base_url)
            .map_err(|cause| LoadSettingsError::InvalidBaseUrl { value: base_url, cause })?;

        Ok(Self {
            base_url,
            request_timeout: millis(config, "request_timeout_ms")?,
            retry: RetryPolicy {
                max_attempts: attempts(config, "retry.max_attempts")?,
                backoff: millis(config, "retry.backoff_ms")?,
            },
            cache_ttl: millis(config, "cache.ttl_ms")?,
            auto_refresh_interval: millis(config, "auto_refresh.interval_ms")?,
        })
    }
}

fn millis(config: &Config, field: &'static str) -> Result<Duration, LoadSettingsError> {
    let value = config.get_int(field)?;
    u64::try_from(value)
        .map(Duration::from_millis)
        .map_err(|_| LoadSettingsError::OutOfRange { field, value })
}

fn attempts(config: &Config, field: &'static str) -> Result<u32, LoadSettingsError> {
    let value = config.get_int(field)?;
    u32::try_from(value)
        .map_err(|_| LoadSettingsError::OutOfRange { field, value })
}

fn builder() -> config::ConfigBuilder<DefaultState> {
    Config::builder()
        .add_source(config::File::from_str(DEFAULTS, FileFormat::Toml))
}

fn with_environment(builder: config::ConfigBuilder<DefaultState>) -> config::ConfigBuilder<DefaultState> {
    builder.add_source(
        config::Environment::with_prefix("CANVASS_WARD")
            .separator("__")
            .try_parsing(true)
    )
}
