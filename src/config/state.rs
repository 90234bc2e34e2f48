// Application state module
// Immutable configuration plus the registered fallback rules

use std::sync::atomic::{AtomicBool, Ordering};

use super::types::Config;
use crate::error::Result;
use crate::routing::FallbackRegistry;

/// Application state shared by every connection task
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub registry: FallbackRegistry,

    // Cached config values for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    /// Build the state and run the one-shot fallback registration
    pub fn new(config: Config) -> Result<Self> {
        let registry = FallbackRegistry::from_config(&config.spa)?;
        let cached_access_log = AtomicBool::new(config.logging.access_log);

        Ok(Self {
            config,
            registry,
            cached_access_log,
        })
    }

    pub fn access_log_enabled(&self) -> bool {
        self.cached_access_log.load(Ordering::Relaxed)
    }
}
