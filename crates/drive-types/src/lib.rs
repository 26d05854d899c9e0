//! Drive Types - Pure type definitions for the Drive content gateway
//!
//! This crate contains only data types with no async runtime dependencies.
//! Nothing here is specific to a particular remote store client; the
//! gateway converts remote records into these shapes before returning them.

pub mod content;
pub mod file;
pub mod tool;

pub use content::*;
pub use file::*;
pub use tool::*;

/// MIME type the remote store reserves for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// URI scheme prefix used for per-file resource URIs
pub const FILE_URI_PREFIX: &str = "gdrive:///";

/// URI of the fixed "recent files" resource
pub const RECENT_FILES_URI: &str = "gdrive://recent-files";

/// Number of entries served by the recent files resource
pub const RECENT_FILES_LIMIT: u32 = 20;
