//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Order of precedence:
//! health probes, the API prefix, static assets, the SPA fallback, 404.

use std::borrow::Cow;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::Body as _;
use hyper::header::{self, HeaderMap};
use hyper::http::request::Parts;
use hyper::{Method, Request, Version};
use percent_encoding::percent_decode_str;

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, cache::CachePolicy, HttpResponse};
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
#[derive(Debug)]
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

/// How a request was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Health,
    Api,
    Asset,
    /// Answered with the index document by the SPA fallback
    Forward,
    Rejected,
    NotFound,
}

/// Main entry point for HTTP request handling
///
/// Only the request head is inspected; bodies are never read.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let (req, _) = req.into_parts();
    let (mut response, dispatch) = route_request(&req, &state).await;

    http::apply_common_headers(
        &mut response,
        &state.config.http,
        header_str(&req.headers, header::ORIGIN).as_deref(),
    );

    tracing::debug!(
        method = %req.method,
        path = req.uri.path(),
        status = response.status().as_u16(),
        ?dispatch,
        "request handled"
    );

    if state.access_log_enabled() {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method.to_string(),
            req.uri.path().to_string(),
        );
        entry.query = req.uri.query().map(ToString::to_string);
        entry.http_version = version_label(req.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = header_str(&req.headers, header::REFERER);
        entry.user_agent = header_str(&req.headers, header::USER_AGENT);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        entry.forwarded = dispatch == Dispatch::Forward;
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Decide how to answer a request
pub async fn route_request(req: &Parts, state: &AppState) -> (HttpResponse, Dispatch) {
    let method = &req.method;
    let cfg = &state.config;

    // 1. Preflight
    if method == Method::OPTIONS {
        return (http::build_options_response(&cfg.http), Dispatch::Rejected);
    }

    // 2. Body size
    if let Some(resp) = check_body_size(&req.headers, cfg.http.max_body_size) {
        return (resp, Dispatch::Rejected);
    }

    // 3. Everything below matches and resolves the decoded path
    let Some(decoded) = decode_path(req.uri.path()) else {
        return (http::build_400_response(), Dispatch::Rejected);
    };
    let path = decoded.as_ref();

    let is_read = matches!(*method, Method::GET | Method::HEAD);

    // 4. Health probes (highest priority, always fast)
    let health = &cfg.spa.health;
    if health.enabled && is_read {
        if path == health.liveness_path {
            return (http::build_health_response(true), Dispatch::Health);
        }
        if path == health.readiness_path {
            let ready =
                static_files::index_available(&cfg.spa.static_dir, state.registry.index_file())
                    .await;
            return (http::build_health_response(ready), Dispatch::Health);
        }
    }

    // 5. API routes are never intercepted by the fallback
    if state.registry.is_api_path(path) {
        return (http::build_api_not_found_response(path), Dispatch::Api);
    }

    if !is_read {
        tracing::warn!("Method not allowed: {method} {path}");
        return (http::build_405_response(), Dispatch::Rejected);
    }

    let ctx = RequestContext {
        path,
        is_head: *method == Method::HEAD,
        if_none_match: header_str(&req.headers, header::IF_NONE_MATCH),
        range_header: header_str(&req.headers, header::RANGE),
    };
    let index_file = state.registry.index_file();

    // 6. Static assets served as-is
    if let Some(file) = static_files::load_asset(&cfg.spa.static_dir, path, index_file).await {
        let policy = if file.path.file_name().is_some_and(|n| n == index_file) {
            CachePolicy::NoCache
        } else {
            CachePolicy::Public(cfg.http.asset_max_age)
        };
        return (static_files::serve_file(&ctx, &file, policy), Dispatch::Asset);
    }

    // 7. SPA fallback
    if state.registry.forwards(path) {
        return match static_files::load_index(&cfg.spa.static_dir, index_file).await {
            Some(index) => (
                static_files::serve_file(&ctx, &index, CachePolicy::NoCache),
                Dispatch::Forward,
            ),
            None => (http::build_404_response(), Dispatch::NotFound),
        };
    }

    (http::build_404_response(), Dispatch::NotFound)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<HttpResponse> {
    let size_str = headers.get(header::CONTENT_LENGTH)?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            tracing::error!("Request body too large: {size} bytes (max: {max_body_size})");
            Some(http::build_413_response())
        }
        Ok(_) => None,
        Err(_) => {
            tracing::warn!("Invalid Content-Length value: '{size_str}', skipping size check");
            None
        }
    }
}

/// Percent-decode a request path; `None` when it is not valid UTF-8
fn decode_path(raw: &str) -> Option<Cow<'_, str>> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("Rejected undecodable request path {raw}: {e}");
            None
        }
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
