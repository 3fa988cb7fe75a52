use std::path::Path;

use tokio::fs;

use crate::files::path::NormalizedPath;
use crate::http::response::{Response, StatusCode};

const NOT_DELETED: &str = "File not found or cannot delete\n";

/// GET /delete/<path>
///
/// Only regular files are removed. A missing path, a directory and a failed
/// unlink all get the same 404.
pub async fn handle_delete(root: &Path, url_path: &str, max_path_len: usize) -> Response {
    let path = match NormalizedPath::from_url(url_path, max_path_len) {
        Ok(path) if !path.is_root() => path,
        _ => return Response::bad_request("Invalid filename\n"),
    };
    let target = path.resolve(root);

    match fs::metadata(&target).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Response::text(StatusCode::NotFound, NOT_DELETED),
    }

    if let Err(e) = fs::remove_file(&target).await {
        tracing::debug!(path = %path, error = %e, "unlink failed after stat");
        return Response::text(StatusCode::NotFound, NOT_DELETED);
    }

    tracing::info!(path = %path, "file deleted");
    Response::ok("Deleted\n")
}
