//! Chat UI delivery
//!
//! The built browser client under `ui/dist` ships inside the binary. A
//! filesystem fallback keeps `cargo run` usable while editing the UI
//! without rebuilding; lookups are confined to the asset root, so request
//! paths cannot name anything outside `ui/dist/assets`.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::{Component, PathBuf};

#[derive(Embed)]
#[folder = "ui/dist"]
struct UiAssets;

/// Serve the SPA shell
pub async fn serve_spa() -> Response {
    if let Some(file) = UiAssets::get("index.html") {
        if let Ok(html) = String::from_utf8(file.data.to_vec()) {
            return Html(html).into_response();
        }
    }

    match std::fs::read_to_string("ui/dist/index.html") {
        Ok(html) => Html(html).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI assets missing from ui/dist</h1>".to_string()),
        )
            .into_response(),
    }
}

/// Serve one file from the asset root
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let Some(relative) = sanitize(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let key = format!("assets/{}", relative.to_string_lossy());
    let mime = mime_guess::from_path(&key).first_or_octet_stream();

    if let Some(file) = UiAssets::get(&key) {
        return (
            [(header::CONTENT_TYPE, mime.as_ref())],
            file.data.to_vec(),
        )
            .into_response();
    }

    match std::fs::read(PathBuf::from("ui/dist/assets").join(&relative)) {
        Ok(bytes) => ([(header::CONTENT_TYPE, mime.as_ref())], bytes).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Keep only plain segments. A path carrying `..`, a root, or a drive
/// prefix can address files outside the asset root and is rejected whole.
fn sanitize(raw: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in std::path::Path::new(raw).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}
