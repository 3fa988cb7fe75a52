use crate::http::request::Method;

pub const FILE_PREFIX: &str = "/file/";
pub const DELETE_PREFIX: &str = "/delete/";
pub const UPLOAD_PREFIX: &str = "/upload/";
pub const EXEC_PATH: &str = "/exec";

/// What a request resolves to. Path payloads are still URL-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Directory listing of the whole request path.
    Listing(&'a str),
    /// Download of the path after `/file/`.
    Download(&'a str),
    /// Delete of the path after `/delete/`.
    Delete(&'a str),
    /// Upload to the path after `/upload/`.
    Upload(&'a str),
    Exec,
    NotFound,
    MethodNotAllowed,
}

impl<'a> Route<'a> {
    /// Maps a method and a request path (no query string) to a route.
    ///
    /// # Example
    ///
    /// ```
    /// # use falcon::http::request::Method;
    /// # use falcon::http::router::Route;
    /// assert_eq!(Route::resolve(&Method::GET, "/file/a/b.txt"), Route::Download("a/b.txt"));
    /// assert_eq!(Route::resolve(&Method::GET, "/docs/"), Route::Listing("/docs/"));
    /// assert_eq!(Route::resolve(&Method::POST, "/exec/"), Route::NotFound);
    /// ```
    pub fn resolve(method: &Method, path: &'a str) -> Self {
        match method {
            Method::GET => {
                if let Some(rest) = path.strip_prefix(FILE_PREFIX) {
                    Route::Download(rest)
                } else if let Some(rest) = path.strip_prefix(DELETE_PREFIX) {
                    Route::Delete(rest)
                } else {
                    Route::Listing(path)
                }
            }
            Method::PUT => match path.strip_prefix(UPLOAD_PREFIX) {
                Some(rest) => Route::Upload(rest),
                None => Route::NotFound,
            },
            Method::POST if path == EXEC_PATH => Route::Exec,
            Method::POST => Route::NotFound,
            Method::Other(_) => Route::MethodNotAllowed,
        }
    }
}
