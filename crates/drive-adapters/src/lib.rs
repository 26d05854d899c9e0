//! Remote store transports for the Drive content gateway

mod auth;
mod google_drive;

pub use auth::{StaticToken, TokenSource};
pub use google_drive::{
    map_status, multipart_body, GoogleDriveConfig, GoogleDriveTransport, DEFAULT_API_BASE,
    DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_BASE,
};
