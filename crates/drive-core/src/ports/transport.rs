//! Remote store transport port

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a transport implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("invalid page token: {0}")]
    InvalidPageToken(String),

    #[error("expired page token: {0}")]
    ExpiredPageToken(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("response decode failed: {0}")]
    Decode(String),
}

/// File metadata record as the remote store returns it
///
/// Field names follow the store's wire format. Fields the store sends that
/// are not listed here are discarded during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// Decimal byte count; the store encodes int64 values as strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// One page of a remote `files.list` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileList {
    #[serde(default)]
    pub files: Vec<RemoteFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Parameters of a remote listing
///
/// Listing, full-text search and the recent view are all listings that
/// differ only in query text and ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Query in the store's search syntax
    pub q: String,
    pub page_size: u32,
    /// Raw token issued by the store, never by the gateway
    pub page_token: Option<String>,
    pub order_by: Option<String>,
}

/// Metadata for a file or folder about to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

/// Body of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadBody {
    /// UTF-8 text sent as-is
    Text(String),
    /// Base64 text the store decodes on receipt
    Base64(String),
}

impl UploadBody {
    pub fn as_str(&self) -> &str {
        match self {
            UploadBody::Text(s) | UploadBody::Base64(s) => s,
        }
    }

    pub fn is_base64(&self) -> bool {
        matches!(self, UploadBody::Base64(_))
    }
}

/// Authenticated client for the remote store
///
/// Implementations own authentication and token refresh. The gateway
/// receives one at construction and shares it between calls.
#[async_trait]
pub trait DriveTransport: Send + Sync {
    /// Fetch metadata for a single file
    async fn get_metadata(&self, file_id: &str) -> Result<RemoteFile, TransportError>;

    /// Run a listing query
    async fn list_files(&self, query: &ListQuery) -> Result<RemoteFileList, TransportError>;

    /// Download the stored bytes of a file
    async fn get_content(&self, file_id: &str) -> Result<Bytes, TransportError>;

    /// Ask the store to convert a native document into `export_mime`
    async fn export_file(&self, file_id: &str, export_mime: &str) -> Result<Bytes, TransportError>;

    /// Create a new file with content
    async fn create_file(
        &self,
        metadata: &NewFile,
        body: &UploadBody,
    ) -> Result<RemoteFile, TransportError>;

    /// Create a metadata-only entry such as a folder
    async fn create_folder(&self, metadata: &NewFile) -> Result<RemoteFile, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_file_drops_unknown_fields() {
        let raw = r#"{
            "kind": "drive#file",
            "id": "1a2b",
            "name": "notes.txt",
            "mimeType": "text/plain",
            "size": "11",
            "modifiedTime": "2024-05-01T10:00:00.000Z",
            "parents": ["root"],
            "webViewLink": "https://example.invalid/1a2b"
        }"#;
        let file: RemoteFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.id, "1a2b");
        assert_eq!(file.size.as_deref(), Some("11"));
        assert_eq!(file.parents, vec!["root".to_string()]);
    }

    #[test]
    fn test_new_file_omits_empty_parents() {
        let meta = NewFile {
            name: "Reports".into(),
            mime_type: "application/vnd.google-apps.folder".into(),
            parents: vec![],
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("parents").is_none());
        assert_eq!(json["mimeType"], "application/vnd.google-apps.folder");
    }
}
