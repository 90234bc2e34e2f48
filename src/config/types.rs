// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Single-segment path, e.g. `/dashboard`
pub const SINGLE_SEGMENT_PATTERN: &str = r"^/\w+$";
/// Any depth ending in a word segment, e.g. `/dashboard/settings`
pub const MULTI_SEGMENT_PATTERN: &str = r"^(?:/[^/]+)*/\w+$";
/// Extension-less paths nested below a word segment, e.g. `/users/jane-doe/`
pub const NESTED_PATTERN: &str = r"^/\w+(?:/[^/.]*)*$";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub spa: SpaConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    pub access_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "combined".to_string(),
            access_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_timeout: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
            shutdown_timeout: 10,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub cors_allow_origins: Vec<String>,
    pub max_body_size: u64,
    /// `max-age` for static assets, in seconds
    pub asset_max_age: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: "spa-server/0.1".to_string(),
            enable_cors: false,
            cors_allow_origins: vec!["*".to_string()],
            max_body_size: 10_485_760, // 10MB
            asset_max_age: 3600,
        }
    }
}

/// Single-page application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SpaConfig {
    /// Directory holding the built frontend (`index.html` plus assets)
    pub static_dir: String,
    /// Entry document every forwarded path receives
    pub index_file: String,
    /// Requests under this prefix are never forwarded
    pub api_prefix: String,
    /// Regexes registered with the fallback registry, tried in order
    pub forward_patterns: Vec<String>,
    pub health: HealthConfig,
}

impl Default for SpaConfig {
    fn default() -> Self {
        Self {
            static_dir: "static".to_string(),
            index_file: "index.html".to_string(),
            api_prefix: "/api".to_string(),
            forward_patterns: vec![
                SINGLE_SEGMENT_PATTERN.to_string(),
                MULTI_SEGMENT_PATTERN.to_string(),
                NESTED_PATTERN.to_string(),
            ],
            health: HealthConfig::default(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct HealthConfig {
    /// Enable health check endpoints
    pub enabled: bool,
    /// Liveness probe path (default: /api/health)
    pub liveness_path: String,
    /// Readiness probe path (default: /api/ready)
    pub readiness_path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            liveness_path: "/api/health".to_string(),
            readiness_path: "/api/ready".to_string(),
        }
    }
}
