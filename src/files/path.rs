//! Client path sanitizing.
//!
//! A [`NormalizedPath`] is the only way a request path reaches the
//! filesystem. It is root-relative, starts with the `.` root marker, and
//! holds no `..`, `.` or empty segment.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

pub const ROOT_MARKER: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path contains a '..' segment")]
    Traversal,

    #[error("normalized path exceeds {max} bytes")]
    TooLong { max: usize },

    #[error("path is not valid percent-encoded UTF-8")]
    Encoding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Normalizes a slash-separated path.
    ///
    /// Leading and repeated slashes collapse, `.` segments are dropped, any
    /// `..` segment rejects the whole path. The result, root marker
    /// included, is at most `max_len` bytes.
    ///
    /// # Example
    ///
    /// ```
    /// # use falcon::files::path::NormalizedPath;
    /// let p = NormalizedPath::normalize("//docs///a.txt", 511).unwrap();
    /// assert_eq!(p.as_str(), "./docs/a.txt");
    /// assert!(NormalizedPath::normalize("/docs/../etc", 511).is_err());
    /// ```
    pub fn normalize(path: &str, max_len: usize) -> Result<Self, PathError> {
        if max_len < ROOT_MARKER.len() {
            return Err(PathError::TooLong { max: max_len });
        }

        let mut out = String::from(ROOT_MARKER);
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(PathError::Traversal),
                _ => {}
            }

            if out.len() + 1 + segment.len() > max_len {
                return Err(PathError::TooLong { max: max_len });
            }
            out.push('/');
            out.push_str(segment);
        }

        Ok(Self(out))
    }

    /// Percent-decodes a URL path, then normalizes it.
    ///
    /// Decoding comes first so an encoded `%2E%2E` is still a traversal.
    pub fn from_url(url_path: &str, max_len: usize) -> Result<Self, PathError> {
        let decoded: Cow<'_, str> =
            urlencoding::decode(url_path).map_err(|_| PathError::Encoding)?;
        if decoded.contains('\0') {
            return Err(PathError::Encoding);
        }
        Self::normalize(&decoded, max_len)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the bare root marker.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_MARKER
    }

    /// The last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// Segments after the root marker.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').skip(1)
    }

    /// Joins the path under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.segments().fold(root.to_path_buf(), |mut acc, seg| {
            acc.push(seg);
            acc
        })
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
