//! Event store configuration

use serde::{Deserialize, Serialize};

/// Which backing implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Volatile in-process store
    Memory,
    /// Postgres with migrations applied at startup
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Connection string for the postgres backend
    pub database_url: String,

    /// Pool size for the postgres backend
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: "postgresql://localhost/trellis".to_string(),
            max_connections: 5,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == StoreBackend::Postgres && self.database_url.is_empty() {
            return Err("database_url must be set for the postgres backend".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }
        Ok(())
    }
}
