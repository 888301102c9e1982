//! Configuration for the API service.

use std::net::SocketAddr;

use anyhow::Result;

/// API service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on for HTTP connections.
    pub listen_addr: SocketAddr,

    /// Path to the kitchen topology YAML file.
    pub topology_path: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("DISPATCH_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let topology_path = std::env::var("DISPATCH_TOPOLOGY")
            .unwrap_or_else(|_| "config/development.yaml".to_string());

        let log_level = std::env::var("DISPATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            listen_addr,
            topology_path,
            log_level,
        })
    }
}
