use std::cmp::Ordering;
use std::path::Path;

use tokio::fs;

use crate::files::html;
use crate::files::path::NormalizedPath;
use crate::http::response::Response;

/// One member of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes, as reported by `stat`.
    pub size: u64,
}

impl DirectoryEntry {
    /// Listing order: ASCII case-insensitive by name, and for names that
    /// compare equal the directory first.
    pub fn listing_order(a: &Self, b: &Self) -> Ordering {
        let lower = |s: &str| s.bytes().map(|c| c.to_ascii_lowercase()).collect::<Vec<_>>();
        lower(&a.name)
            .cmp(&lower(&b.name))
            .then_with(|| b.is_dir.cmp(&a.is_dir))
    }
}

pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(DirectoryEntry::listing_order);
}

/// Reads and sorts the members of `dir`.
///
/// Members that cannot be stat'ed are left out. Failing to open `dir`
/// itself is an error.
pub async fn read_entries(dir: &Path) -> std::io::Result<Vec<DirectoryEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();

        // Follows symlinks, like stat(2).
        let meta = match fs::metadata(entry.path()).await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(name = %name, error = %e, "skipping unreadable entry");
                continue;
            }
        };

        entries.push(DirectoryEntry {
            name,
            is_dir: meta.is_dir(),
            size: meta.len(),
        });
    }

    sort_entries(&mut entries);
    Ok(entries)
}

/// GET on any path that is not a download or delete.
pub async fn serve_listing(root: &Path, url_path: &str, max_path_len: usize) -> Response {
    let path = match NormalizedPath::from_url(url_path, max_path_len) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(path = url_path, error = %e, "rejected listing path");
            return Response::bad_request("Invalid path\n");
        }
    };

    // A missing directory is a server fault here, not a 404.
    let entries = match read_entries(&path.resolve(root)).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "cannot list directory");
            return Response::internal_error();
        }
    };

    Response::html(html::render_listing(url_path, &entries))
}
