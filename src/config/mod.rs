//! Configuration management
//!
//! Server configuration, database location and execution-engine
//! connection parameters, all overridable through environment variables
//! for container deployment.

use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// External execution engine configuration
    pub engine: EngineConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding the platform SQLite database (default: "data")
    pub data_dir: String,
}

/// Execution engine connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the external execution engine
    pub base_url: String,
    /// Request timeout for submit/inspect calls, in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    /// Default configuration with env-var overrides for deployment.
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("CREDFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("CREDFLOW_PORT")
                    .unwrap_or_else(|_| "3010".to_string())
                    .parse()
                    .unwrap_or(3010),
            },
            database: DatabaseConfig {
                data_dir: std::env::var("CREDFLOW_DATA_DIR")
                    .unwrap_or_else(|_| "data".to_string()),
            },
            engine: EngineConfig {
                base_url: std::env::var("CREDFLOW_ENGINE_URL")
                    .unwrap_or_else(|_| "http://localhost:3020".to_string()),
                timeout_secs: std::env::var("CREDFLOW_ENGINE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap_or(15),
            },
        }
    }
}
