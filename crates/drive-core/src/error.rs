//! Error types for the Drive gateway

use serde::Serialize;
use thiserror::Error;

use crate::ports::TransportError;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failure returned by every gateway operation
///
/// Remote failures are always mapped onto one of these kinds; no transport
/// vocabulary leaks past the gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("No export target for MIME type {0}")]
    UnsupportedExport(String),

    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Stable, caller-facing error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    InvalidCursor,
    UnsupportedExport,
    PayloadTooLarge,
    RemoteUnavailable,
    InvalidArgument,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::InvalidCursor => "invalid_cursor",
            ErrorKind::UnsupportedExport => "unsupported_export",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::RemoteUnavailable => "remote_unavailable",
            ErrorKind::InvalidArgument => "invalid_argument",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            GatewayError::InvalidCursor(_) => ErrorKind::InvalidCursor,
            GatewayError::UnsupportedExport(_) => ErrorKind::UnsupportedExport,
            GatewayError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            GatewayError::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            GatewayError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Only transient remote failures are worth retrying; the gateway
    /// itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::RemoteUnavailable(_))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        GatewayError::InvalidArgument(message.into())
    }
}

impl From<TransportError> for GatewayError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::NotFound(what) => GatewayError::NotFound(what),
            TransportError::PermissionDenied(msg) => GatewayError::PermissionDenied(msg),
            TransportError::Unauthenticated(msg) => {
                GatewayError::PermissionDenied(format!("credentials rejected: {}", msg))
            }
            TransportError::InvalidPageToken(msg) => GatewayError::InvalidCursor(msg),
            // An expired token is a store-side condition; the caller restarts the listing
            TransportError::ExpiredPageToken(msg) => {
                GatewayError::RemoteUnavailable(format!("page token expired: {}", msg))
            }
            TransportError::Rejected(msg) => GatewayError::InvalidArgument(msg),
            TransportError::RateLimited(msg) => {
                GatewayError::RemoteUnavailable(format!("rate limited: {}", msg))
            }
            TransportError::Unavailable(msg) => GatewayError::RemoteUnavailable(msg),
            TransportError::Decode(msg) => {
                GatewayError::RemoteUnavailable(format!("unreadable response: {}", msg))
            }
        }
    }
}
