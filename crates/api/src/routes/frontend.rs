//! Static marketing site serving.
//!
//! Serves the static export of the public site (home, blog, pricing, careers,
//! about, legal pages) from `frontend.base_dir`. Extensionless routes fall back
//! to `<route>.html`, `<route>/index.html`, then the root `index.html`.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::config::FrontendConfig;

pub async fn serve_frontend(State(state): State<AppState>, uri: Uri) -> Response {
    let config = &state.config.frontend;
    let base_dir = PathBuf::from(&config.base_dir);

    if !base_dir.is_dir() {
        warn!(dir = %base_dir.display(), "Frontend directory does not exist");
        return (StatusCode::SERVICE_UNAVAILABLE, "Frontend not available").into_response();
    }

    let path = uri.path().trim_start_matches('/');
    let requested = if path.is_empty() {
        base_dir.join("index.html")
    } else {
        base_dir.join(path)
    };

    if !is_safe_path(&base_dir, &requested) {
        warn!(requested_path = %uri.path(), "Path traversal attempt detected");
        return StatusCode::FORBIDDEN.into_response();
    }

    for candidate in candidates(&base_dir, path, requested) {
        match serve_file(&candidate, config).await {
            Ok(response) => return response,
            Err(e) => debug!(path = %candidate.display(), error = %e, "Frontend candidate missing"),
        }
    }

    StatusCode::NOT_FOUND.into_response()
}

/// Files to try for a request path, in order.
fn candidates(base_dir: &Path, path: &str, requested: PathBuf) -> Vec<PathBuf> {
    let mut candidates = vec![requested.clone()];

    let has_extension = Path::new(path).extension().is_some();
    if !has_extension && !path.is_empty() {
        let trimmed = path.trim_end_matches('/');
        candidates.push(base_dir.join(format!("{}.html", trimmed)));
        candidates.push(requested.join("index.html"));
        candidates.push(base_dir.join("index.html"));
    }

    candidates
}

async fn serve_file(path: &Path, config: &FrontendConfig) -> Result<Response, std::io::Error> {
    if !fs::metadata(path).await?.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "not a regular file",
        ));
    }

    let content = fs::read(path).await?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let cache_control = if is_immutable_asset(path) {
        format!(
            "public, max-age={}, immutable",
            config.immutable_cache_max_age
        )
    } else {
        format!("public, max-age={}", config.mutable_cache_max_age)
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, cache_control),
        ],
        Body::from(content),
    )
        .into_response())
}

/// Whether `path` stays inside `base` once `.` and `..` are resolved.
fn is_safe_path(base: &Path, path: &Path) -> bool {
    if path.exists() {
        match (base.canonicalize(), path.canonicalize()) {
            (Ok(canonical_base), Ok(canonical_path)) => canonical_path.starts_with(canonical_base),
            _ => false,
        }
    } else {
        normalize_path(path).starts_with(normalize_path(base))
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            component => result.push(component),
        }
    }
    result
}

/// Hashed build output lives under `_next/static/`.
fn is_immutable_asset(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    path_str.contains("_next/static/") || path_str.contains("_next\\static\\")
}
