//! SPA fallback registry
//!
//! Holds the forward rules registered once at startup. A request path that is
//! outside the API prefix and matches any rule is answered with the index
//! document so the frontend router can take over.

use super::matcher::{is_under_prefix, ForwardPattern};
use crate::config::{SpaConfig, MULTI_SEGMENT_PATTERN, NESTED_PATTERN, SINGLE_SEGMENT_PATTERN};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FallbackRegistry {
    api_prefix: String,
    index_file: String,
    patterns: Vec<ForwardPattern>,
}

impl FallbackRegistry {
    /// Create an empty registry; nothing is forwarded until patterns are added
    pub fn new(api_prefix: &str, index_file: &str) -> Self {
        Self {
            api_prefix: api_prefix.to_string(),
            index_file: index_file.to_string(),
            patterns: Vec::new(),
        }
    }

    /// Registry with the single-segment, multi-segment and nested rules
    pub fn with_defaults(api_prefix: &str, index_file: &str) -> Result<Self> {
        let mut registry = Self::new(api_prefix, index_file);
        for pattern in [SINGLE_SEGMENT_PATTERN, MULTI_SEGMENT_PATTERN, NESTED_PATTERN] {
            registry.add_forward(pattern)?;
        }
        Ok(registry)
    }

    pub fn from_config(spa: &SpaConfig) -> Result<Self> {
        let mut registry = Self::new(&spa.api_prefix, &spa.index_file);
        for pattern in &spa.forward_patterns {
            registry.add_forward(pattern)?;
        }
        tracing::debug!(
            api_prefix = %registry.api_prefix,
            patterns = registry.patterns.len(),
            "SPA fallback registered"
        );
        Ok(registry)
    }

    /// Compile and register one forward rule
    pub fn add_forward(&mut self, pattern: &str) -> Result<&mut Self> {
        self.patterns.push(ForwardPattern::compile(pattern)?);
        Ok(self)
    }

    pub fn is_api_path(&self, path: &str) -> bool {
        is_under_prefix(&self.api_prefix, path)
    }

    /// Whether `path` should be answered with the index document
    pub fn forwards(&self, path: &str) -> bool {
        !self.is_api_path(path) && self.patterns.iter().any(|p| p.is_match(path))
    }

    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(ForwardPattern::as_str)
    }
}
