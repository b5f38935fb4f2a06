use std::path::Path;

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};

const KNOWN_ASSETS: [&str; 6] = [
    "/",
    "/index.html",
    "/app.js",
    "/manifest.json",
    "/offline.html",
    "/sw.js",
];

pub fn is_static_asset(path: &str) -> bool {
    KNOWN_ASSETS.contains(&path)
}

/// Cache-Control for a request path, `None` for anything outside the app shell.
pub fn cache_policy(path: &str) -> Option<&'static str> {
    match path {
        // always revalidated
        "/sw.js" => Some("no-cache"),
        p if is_static_asset(p) => Some("public, max-age=3600"),
        _ => None,
    }
}

async fn cache_headers(req: Request, next: Next) -> Response {
    let policy = cache_policy(req.uri().path());
    let mut res = next.run(req).await;
    if let Some(value) = policy {
        if res.status().is_success() {
            res.headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static(value));
        }
    }
    res
}

/// Browser navigations ask for HTML; scripts, styles and fetches do not.
pub fn wants_document(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/html"))
}

// The offline page is only for documents, other misses get a bare 404.
async fn document_fallback(req: Request, next: Next) -> Response {
    let document = wants_document(req.headers());
    let res = next.run(req).await;
    if res.status() == StatusCode::NOT_FOUND && !document {
        return StatusCode::NOT_FOUND.into_response();
    }
    res
}

/// Static files from `dir`. A missing file requested as a document answers
/// 404 with the offline page, or the index page when the directory has no
/// offline page. Other missing files answer an empty 404.
pub fn router(dir: &Path) -> Router {
    let offline = dir.join("offline.html");
    let fallback = if offline.is_file() {
        offline
    } else {
        dir.join("index.html")
    };

    Router::new()
        .fallback_service(ServeDir::new(dir).not_found_service(ServeFile::new(fallback)))
        .layer(middleware::from_fn(document_fallback))
        .layer(middleware::from_fn(cache_headers))
}
