//! # Configuration
//!
//! Layered runtime configuration: defaults, an optional config file and
//! `PAY_DISPATCH`-prefixed environment variables, later sources winning.
//!
//! ```text
//! PAY_DISPATCH__SERVER__PORT=8080
//! PAY_DISPATCH__DISPATCH__MAX_ATTEMPTS=5
//! PAY_DISPATCH__DISPATCH__ROUTING_POLICY=aggregators_first
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Dispatch settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    /// Maximum attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Routing policy: `requisites_first` or `aggregators_first`.
    #[serde(default = "default_routing_policy")]
    pub routing_policy: String,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_routing_policy() -> String {
    "requisites_first".to_string()
}

/// SLA sweeper settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SlaSettings {
    /// Sweep tick in milliseconds.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

fn default_sweep_interval_ms() -> u64 {
    500
}

/// Top-level application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Dispatch settings.
    pub dispatch: DispatchSettings,
    /// SLA sweeper settings.
    pub sla: SlaSettings,
}

impl Settings {
    /// Loads settings from `config/default.toml` (optional) and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a source fails to parse or a value
    /// cannot be deserialized.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("dispatch.max_attempts", i64::from(default_max_attempts()))?
            .set_default("dispatch.routing_policy", default_routing_policy())?
            .set_default("sla.sweep_interval_ms", default_sweep_interval_ms() as i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("PAY_DISPATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the socket address string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
