use crate::config::{default_port, default_server_enabled};

use serde::{Deserialize, Serialize};

/// Embedded web server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Serve status and recordings over HTTP.
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,

    /// Port for the embedded web server.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            port: default_port(),
        }
    }
}
