use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};
use crate::fusion::FusionStrategy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    pub logging: LoggingConfig,
}

/// How outcomes are acquired from the external source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Persistent WebSocket connection with a subscription handshake.
    Push,
    /// Periodic HTTP fetch against the proxy, gated by a health check.
    Poll,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub mode: FeedMode,
    pub ws_url: String,
    pub api_url: String,
    /// Poll-mode fetch interval.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl FeedConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

const fn default_poll_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    /// Base reconnect delay; attempt `n` waits `base × n`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Attempts before giving up and entering degraded mode.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Emission period of the degraded-mode synthetic generator.
    #[serde(default = "default_synthetic_period_secs")]
    pub synthetic_period_secs: u64,
}

impl ReconnectConfig {
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    #[must_use]
    pub const fn synthetic_period(&self) -> Duration {
        Duration::from_secs(self.synthetic_period_secs)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_attempts: default_max_attempts(),
            synthetic_period_secs: default_synthetic_period_secs(),
        }
    }
}

const fn default_base_delay_ms() -> u64 {
    3000
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_synthetic_period_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Spacing between projected signal slots.
    #[serde(default = "default_signal_interval_secs")]
    pub interval_secs: u64,
    /// Per-slot probability of overriding the fused prediction.
    #[serde(default = "default_override_probability")]
    pub override_probability: f64,
}

impl SignalConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_signal_interval_secs(),
            override_probability: default_override_probability(),
        }
    }
}

const fn default_signal_interval_secs() -> u64 {
    60
}

const fn default_override_probability() -> f64 {
    0.3
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub strategy: FusionStrategy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.feed.ws_url.is_empty() {
            return Err(ConfigError::MissingField { field: "ws_url" }.into());
        }
        if self.feed.api_url.is_empty() {
            return Err(ConfigError::MissingField { field: "api_url" }.into());
        }
        url::Url::parse(&self.feed.ws_url).map_err(|e| ConfigError::InvalidValue {
            field: "ws_url",
            reason: e.to_string(),
        })?;
        url::Url::parse(&self.feed.api_url).map_err(|e| ConfigError::InvalidValue {
            field: "api_url",
            reason: e.to_string(),
        })?;
        if !(0.0..=1.0).contains(&self.signals.override_probability) {
            return Err(ConfigError::InvalidValue {
                field: "override_probability",
                reason: "must be within 0.0..=1.0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                mode: FeedMode::Poll,
                ws_url: "wss://feed.example.com/replication".into(),
                api_url: "https://proxy.example.com".into(),
                poll_interval_secs: default_poll_interval_secs(),
            },
            reconnect: ReconnectConfig::default(),
            signals: SignalConfig::default(),
            fusion: FusionConfig::default(),
            logging: LoggingConfig {
                level: "info".into(),
                format: "pretty".into(),
            },
        }
    }
}
