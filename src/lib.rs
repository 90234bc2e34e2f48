//! Static web server for single-page applications.
//!
//! Serves a frontend build directory and forwards client-side routes to its
//! `index.html`, while leaving everything under the API prefix alone.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;

pub use error::{Result, ServerError};
