//! Request handler module
//!
//! Dispatches requests between health probes, the API prefix, static assets
//! and the SPA fallback.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, route_request, Dispatch};
