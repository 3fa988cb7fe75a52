//! Filesystem operations behind the GET and PUT routes.
//!
//! Every handler takes the service root and a still URL-encoded path,
//! builds a [`path::NormalizedPath`] from it and maps its own failures to a
//! status code.

pub mod delete;
pub mod html;
pub mod listing;
pub mod path;
pub mod transfer;

pub use delete::handle_delete;
pub use listing::{DirectoryEntry, serve_listing};
pub use path::{NormalizedPath, PathError};
pub use transfer::{handle_upload, serve_download};
