//! Static file serving module
//!
//! Resolves request paths inside the static directory and builds cacheable
//! file responses. Also loads the SPA entry document for forwarded requests.

use std::path::{Component, Path, PathBuf};

use tokio::fs;

use crate::handler::router::RequestContext;
use crate::http::{self, cache, cache::CachePolicy, mime, FileBody, HttpResponse, RangeParseResult};

/// A file read from the static directory
#[derive(Debug)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

/// Load the asset a request path names
///
/// Directories (including `/`) resolve to their index document. Returns `None`
/// for anything missing, unreadable or outside `static_dir`.
pub async fn load_asset(static_dir: &str, request_path: &str, index_file: &str) -> Option<LoadedFile> {
    let relative = sanitize_path(request_path)?;
    let root = match fs::canonicalize(static_dir).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("Static directory not found or inaccessible '{static_dir}': {e}");
            return None;
        }
    };

    let mut file_path = root.join(&relative);
    if fs::metadata(&file_path).await.ok()?.is_dir() {
        file_path = file_path.join(index_file);
    }

    // Missing files are the common case for client routes; no log
    let canonical = fs::canonicalize(&file_path).await.ok()?;
    if !canonical.starts_with(&root) {
        tracing::warn!(
            "Path traversal attempt blocked: {request_path} -> {}",
            canonical.display()
        );
        return None;
    }
    if !fs::metadata(&canonical).await.ok()?.is_file() {
        return None;
    }

    read_file(canonical).await
}

/// Load the SPA entry document
pub async fn load_index(static_dir: &str, index_file: &str) -> Option<LoadedFile> {
    let path = Path::new(static_dir).join(index_file);
    let loaded = read_file(path).await;
    if loaded.is_none() {
        tracing::error!("SPA index document missing: {static_dir}/{index_file}");
    }
    loaded
}

/// Whether the entry document is present and readable
pub async fn index_available(static_dir: &str, index_file: &str) -> bool {
    fs::metadata(Path::new(static_dir).join(index_file))
        .await
        .is_ok_and(|m| m.is_file())
}

async fn read_file(path: PathBuf) -> Option<LoadedFile> {
    match fs::read(&path).await {
        Ok(data) => Some(LoadedFile {
            content_type: mime::content_type_for(&path),
            path,
            data,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::error!("Failed to read file '{}': {e}", path.display());
            None
        }
    }
}

/// Turn a URL path into a relative filesystem path
///
/// Rejects parent-directory segments outright instead of stripping them.
fn sanitize_path(request_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => relative.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

/// Build a file response with `ETag`, conditional and Range support
pub fn serve_file(ctx: &RequestContext<'_>, file: &LoadedFile, policy: CachePolicy) -> HttpResponse {
    let etag = cache::generate_etag(&file.data);

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag, policy);
    }

    let range = match http::parse_range_header(ctx.range_header.as_deref(), file.data.len()) {
        RangeParseResult::Valid(range) => Some(range),
        RangeParseResult::NotSatisfiable => return http::build_416_response(file.data.len()),
        RangeParseResult::None => None,
    };

    http::build_file_response(&FileBody {
        data: &file.data,
        content_type: file.content_type,
        etag: &etag,
        policy,
        range,
        is_head: ctx.is_head,
    })
}
