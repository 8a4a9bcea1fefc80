//! Service configuration
//!
//! Defaults first, then an optional TOML file named by `TRELLIS_CONFIG`,
//! then environment overrides, then validation.

use event_gateway::ListenerConfig;
use event_store::{StoreBackend, StoreConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_CONFIG_FILE: &str = "TRELLIS_CONFIG";
pub const ENV_HOST: &str = "TRELLIS_HOST";
pub const ENV_PORT: &str = "TRELLIS_PORT";
pub const ENV_STORE_BACKEND: &str = "TRELLIS_STORE_BACKEND";
pub const ENV_DATABASE_URL: &str = "TRELLIS_DATABASE_URL";
pub const ENV_LOG_LEVEL: &str = "TRELLIS_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "TRELLIS_LOG_FORMAT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub service: ServiceSettings,
    pub listener: ListenerConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name used in logs
    pub name: String,

    /// Seconds to wait for tasks to stop before giving up
    pub shutdown_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { name: "trellis-event-service".to_string(), shutdown_timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// error | warn | info | debug | trace
    pub level: String,

    /// json | text
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "text".to_string() }
    }
}

/// Load and validate the effective configuration.
pub fn load_config() -> Result<ServiceConfig, String> {
    let mut config = match std::env::var(ENV_CONFIG_FILE) {
        Ok(path) => ServiceConfig::load_from_file(&path)?,
        Err(_) => ServiceConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

impl ServiceConfig {
    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read config file {path}: {err}"))?;
        toml::from_str(&content).map_err(|err| format!("failed to parse config file {path}: {err}"))
    }

    fn apply_env_overrides(&mut self) -> Result<(), String> {
        if let Ok(host) = std::env::var(ENV_HOST) {
            self.listener.host = host;
        }
        if let Ok(port) = std::env::var(ENV_PORT) {
            self.listener.port =
                port.parse().map_err(|_| format!("invalid {ENV_PORT}: {port}"))?;
        }
        if let Ok(backend) = std::env::var(ENV_STORE_BACKEND) {
            self.store.backend = match backend.as_str() {
                "memory" => StoreBackend::Memory,
                "postgres" => StoreBackend::Postgres,
                other => return Err(format!("invalid {ENV_STORE_BACKEND}: {other}")),
            };
        }
        if let Ok(url) = std::env::var(ENV_DATABASE_URL) {
            self.store.database_url = url;
        }
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
            self.logging.format = format;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listener.port == 0 {
            return Err("listener port must be set".to_string());
        }
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => return Err(format!("invalid log level: {other}")),
        }
        match self.logging.format.as_str() {
            "json" | "text" => {}
            other => return Err(format!("invalid log format: {other}")),
        }
        if self.service.shutdown_timeout_secs == 0 {
            return Err("shutdown timeout must be greater than 0".to_string());
        }
        self.store.validate()
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_log_settings_are_rejected() {
        let mut config = ServiceConfig::default();
        config.logging.level = "chatty".to_string();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_shutdown_timeout_is_rejected() {
        let mut config = ServiceConfig::default();
        config.service.shutdown_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_files_fill_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[listener]\nport = 12345\n\n[store]\nbackend = \"postgres\"\ndatabase_url = \"postgresql://db/orchestrator\"\n"
        )
        .unwrap();

        let config =
            ServiceConfig::load_from_file(file.path().to_str().unwrap()).expect("parses");
        assert_eq!(config.listener.port, 12345);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.database_url, "postgresql://db/orchestrator");
        assert_eq!(config.service.shutdown_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_take_precedence() {
        std::env::set_var(ENV_PORT, "4242");
        std::env::set_var(ENV_STORE_BACKEND, "memory");

        let mut config = ServiceConfig::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.listener.port, 4242);
        assert_eq!(config.store.backend, StoreBackend::Memory);

        std::env::set_var(ENV_PORT, "not-a-port");
        let mut config = ServiceConfig::default();
        assert!(config.apply_env_overrides().is_err());

        std::env::remove_var(ENV_PORT);
        std::env::remove_var(ENV_STORE_BACKEND);
    }
}
