use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::error;

const CONTENT_TYPES: [(&str, &str); 7] = [
    ("html", "text/html"),
    ("js", "application/javascript"),
    ("css", "text/css"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("svg", "image/svg+xml"),
    ("json", "application/json"),
];

pub fn content_type(path: &Path) -> &'static str {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}

/// Maps a request path below `root`. Anything that could climb out of the
/// root resolves to `None`.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let request_path = request_path.split('?').next().unwrap_or_default();
    let request_path = if request_path == "/" { "/index.html" } else { request_path };

    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

pub async fn serve(root: &Path, request_path: &str) -> Response {
    let Some(path) = resolve(root, request_path) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    match fs::try_exists(&path).await {
        Ok(true) => {}
        Ok(false) => return (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(err) => {
            error!("failed to stat {}: {err}", path.display());
            return (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response();
        }
    }

    match fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response(),
        Err(err) => {
            error!("failed to read {}: {err}", path.display());
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}
