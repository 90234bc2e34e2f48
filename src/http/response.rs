//! HTTP response building module
//!
//! Builders for the status codes the server emits, decoupled from routing.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};

use super::cache::CachePolicy;
use super::range::ByteRange;
use crate::config::HttpConfig;

pub type HttpResponse = Response<Full<Bytes>>;

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// A file body ready to be sent, either whole or as one byte range
#[derive(Debug)]
pub struct FileBody<'a> {
    pub data: &'a [u8],
    pub content_type: &'a str,
    pub etag: &'a str,
    pub policy: CachePolicy,
    pub range: Option<ByteRange>,
    pub is_head: bool,
}

/// Build 200 (or 206 when a range is present) file response
pub fn build_file_response(file: &FileBody<'_>) -> HttpResponse {
    let total_size = file.data.len();
    let (status, payload) = match file.range {
        Some(range) => (StatusCode::PARTIAL_CONTENT, range.slice(file.data)),
        None => (StatusCode::OK, file.data),
    };
    let content_length = payload.len();
    let body = if file.is_head {
        Bytes::new()
    } else {
        Bytes::copy_from_slice(payload)
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, file.content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, file.etag)
        .header(header::CACHE_CONTROL, file.policy.to_header_value());
    if let Some(range) = file.range {
        builder = builder.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{total_size}", range.start, range.end),
        );
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, policy: CachePolicy) -> HttpResponse {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, policy.to_header_value())
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 400 Bad Request response
pub fn build_400_response() -> HttpResponse {
    build_text_response(StatusCode::BAD_REQUEST, "400 Bad Request")
}

/// Build 404 Not Found response
pub fn build_404_response() -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> HttpResponse {
    let mut resp = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    resp
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> HttpResponse {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> HttpResponse {
    let mut resp = build_text_response(StatusCode::RANGE_NOT_SATISFIABLE, "Range Not Satisfiable");
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{file_size}")) {
        resp.headers_mut().insert(header::CONTENT_RANGE, value);
    }
    resp
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(http: &HttpConfig) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::ALLOW, ALLOWED_METHODS);

    if http.enable_cors {
        builder = builder
            .header(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                "GET, HEAD, POST, PUT, DELETE, OPTIONS",
            )
            .header(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Content-Type, Accept, Authorization, Range",
            )
            .header(header::ACCESS_CONTROL_MAX_AGE, "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build JSON response from a `serde_json` value
pub fn build_json_response(status: StatusCode, value: &serde_json::Value) -> HttpResponse {
    let body = value.to_string();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .header(header::CACHE_CONTROL, CachePolicy::NoCache.to_header_value())
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build health probe response
pub fn build_health_response(healthy: bool) -> HttpResponse {
    if healthy {
        build_json_response(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
    } else {
        build_json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &serde_json::json!({ "status": "unavailable" }),
        )
    }
}

/// Build 404 for API routes nothing handles
pub fn build_api_not_found_response(path: &str) -> HttpResponse {
    build_json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "not found", "path": path }),
    )
}

/// Stamp headers every response carries: `Server` and, if enabled, CORS
pub fn apply_common_headers(
    resp: &mut HttpResponse,
    http: &HttpConfig,
    request_origin: Option<&str>,
) {
    let headers = resp.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&http.server_name) {
        headers.insert(header::SERVER, value);
    }

    if !http.enable_cors {
        return;
    }
    if let Some(origin) = cors_allow_origin(http, request_origin) {
        if let Ok(value) = HeaderValue::from_str(origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        if origin != "*" {
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }
    }
}

/// Pick the `Access-Control-Allow-Origin` value for a request
///
/// An explicitly listed origin is echoed back; otherwise a `*` entry allows all.
fn cors_allow_origin<'a>(http: &'a HttpConfig, request_origin: Option<&'a str>) -> Option<&'a str> {
    if let Some(origin) = request_origin {
        if http.cors_allow_origins.iter().any(|o| o == origin) {
            return Some(origin);
        }
    }
    http.cors_allow_origins
        .iter()
        .any(|o| o == "*")
        .then_some("*")
}

fn build_text_response(status: StatusCode, text: &'static str) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from_static(text.as_bytes())))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    tracing::error!("Failed to build {status} response: {error}");
}
