// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::{Result, ServerError};

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HealthConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, SpaConfig,
    MULTI_SEGMENT_PATTERN, NESTED_PATTERN, SINGLE_SEGMENT_PATTERN,
};

/// Environment variable prefix, e.g. `SPA__SERVER__PORT=9000`
const ENV_PREFIX: &str = "SPA";
const ENV_SEPARATOR: &str = "__";

impl Config {
    /// Load configuration from specified file path (extension optional)
    ///
    /// Sources, lowest priority first: built-in defaults, the file (skipped
    /// when missing), then `SPA__*` environment variables.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ServerError::InvalidAddress { addr, source })
    }

    /// Reject values that would misroute every request or fail at startup
    pub fn validate(&self) -> Result<()> {
        if self.server.workers == Some(0) {
            return Err(
                config::ConfigError::Message("server.workers must be at least 1".into()).into(),
            );
        }
        if !self.spa.api_prefix.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "spa.api_prefix must start with '/', got '{}'",
                self.spa.api_prefix
            ))
            .into());
        }
        if self.spa.index_file.trim().is_empty() {
            return Err(config::ConfigError::Message("spa.index_file must not be empty".into()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does/not/exist/config").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.spa.api_prefix, "/api");
        assert_eq!(cfg.spa.index_file, "index.html");
        assert_eq!(cfg.spa.forward_patterns.len(), 3);
        assert!(cfg.spa.health.enabled);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[spa]
static_dir = "dist"
api_prefix = "/backend"
"#
        )
        .unwrap();

        let cfg = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.spa.static_dir, "dist");
        assert_eq!(cfg.spa.api_prefix, "/backend");
        // untouched sections keep their defaults
        assert_eq!(cfg.spa.index_file, "index.html");
        assert_eq!(cfg.http.max_body_size, 10_485_760);
    }

    #[test]
    fn test_invalid_api_prefix_rejected() {
        let mut cfg = Config::default();
        cfg.spa.api_prefix = "api".to_string();
        assert!(matches!(cfg.validate(), Err(ServerError::Config(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut cfg = Config::default();
        cfg.server.workers = Some(0);
        assert!(matches!(cfg.validate(), Err(ServerError::Config(_))));

        cfg.server.workers = Some(2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8080);

        cfg.server.host = "not an ip".to_string();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(ServerError::InvalidAddress { .. })
        ));
    }
}
