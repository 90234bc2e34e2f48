//! Path matching primitives
//!
//! Compiled forward patterns and the segment-aware prefix check used to keep
//! API requests away from the fallback.

use regex::Regex;

use crate::error::{Result, ServerError};

/// A compiled forward pattern
#[derive(Debug, Clone)]
pub struct ForwardPattern {
    source: String,
    regex: Regex,
}

impl ForwardPattern {
    pub fn compile(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| ServerError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Check whether `path` lies under `prefix` on a segment boundary
///
/// `/api` covers `/api` and `/api/users` but not `/apiary`.
pub fn is_under_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
