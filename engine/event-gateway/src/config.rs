//! Callback listener configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind
    pub host: String,

    /// Port for the callback listener
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 11100 }
    }
}

impl ListenerConfig {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
