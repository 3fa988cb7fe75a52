use std::path::Path;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::files::path::NormalizedPath;
use crate::http::body::BodyReader;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Filename for `Content-Disposition`, safe to put between quotes.
pub fn disposition_name(path: &NormalizedPath) -> String {
    path.file_name()
        .unwrap_or("download")
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}

/// GET /file/<path>
pub async fn serve_download(root: &Path, url_path: &str, max_path_len: usize) -> Response {
    let path = match NormalizedPath::from_url(url_path, max_path_len) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(path = url_path, error = %e, "rejected download path");
            return Response::bad_request("Invalid filename\n");
        }
    };

    let file = match File::open(path.resolve(root)).await {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "download target cannot be opened");
            return Response::not_found();
        }
    };

    let len = match file.metadata().await {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return Response::not_found(),
    };

    ResponseBuilder::new(StatusCode::Ok)
        .content_type("application/octet-stream")
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", disposition_name(&path)),
        )
        .file(file, len)
        .build()
}

/// PUT /upload/<path>
///
/// The file is created before the body arrives; a body cut short leaves
/// whatever was written.
pub async fn handle_upload<R>(
    root: &Path,
    url_path: &str,
    max_path_len: usize,
    declared_length: Option<u64>,
    body_prefix: Bytes,
    stream: &mut R,
    chunk_size: usize,
) -> Response
where
    R: AsyncRead + Unpin + ?Sized,
{
    let path = match NormalizedPath::from_url(url_path, max_path_len) {
        Ok(path) if !path.is_root() => path,
        _ => return Response::bad_request("Invalid filename\n"),
    };

    let Some(declared) = declared_length else {
        return Response::bad_request("Missing Content-Length\n");
    };

    let mut file = match File::create(path.resolve(root)).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "cannot create upload target");
            return Response::internal_error();
        }
    };

    let mut body = BodyReader::new(body_prefix, declared);
    let mut chunk = vec![0u8; chunk_size.max(1)];

    while !body.is_done() {
        let n = match body.read_chunk(stream, &mut chunk).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "upload aborted");
                return Response::internal_error();
            }
        };

        if let Err(e) = file.write_all(&chunk[..n]).await {
            tracing::warn!(path = %path, error = %e, "upload write failed");
            return Response::internal_error();
        }
    }

    if let Err(e) = file.flush().await {
        tracing::warn!(path = %path, error = %e, "upload flush failed");
        return Response::internal_error();
    }

    tracing::info!(path = %path, bytes = declared, "upload stored");
    Response::text(StatusCode::Created, "Uploaded\n")
}
