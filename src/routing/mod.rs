//! Routing module
//!
//! SPA fallback registration:
//! - Forward patterns compiled once at startup
//! - API prefix exclusion on segment boundaries

mod matcher;
mod registry;

pub use matcher::{is_under_prefix, ForwardPattern};
pub use registry::FallbackRegistry;
