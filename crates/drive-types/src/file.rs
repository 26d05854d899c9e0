//! File metadata types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FILE_URI_PREFIX, FOLDER_MIME_TYPE};

/// A file or folder in the remote store
///
/// Entries are snapshots: the gateway never mutates one, it only reads
/// existing entries or receives new ones from create calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Stored size in bytes; native documents have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl FileEntry {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// Resource URI for this entry (`gdrive:///<id>`)
    pub fn uri(&self) -> String {
        format!("{}{}", FILE_URI_PREFIX, self.id)
    }
}

/// Opaque pagination cursor
///
/// Kept distinct from `String` so a cursor cannot be passed where a file ID
/// or query is expected. The text is produced by the gateway and must be
/// handed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a listing or search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    pub entries: Vec<FileEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<PageToken>,
}

impl FilePage {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Request to create a new file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub name: String,
    /// Raw text, or base64 when `mime_type` is a binary type
    pub content: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl UploadRequest {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            mime_type: mime_type.into(),
            parent_id: None,
        }
    }

    pub fn in_folder(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mime_type: &str) -> FileEntry {
        FileEntry {
            id: "abc123".to_string(),
            name: "Projects".to_string(),
            mime_type: mime_type.to_string(),
            modified_time: None,
            created_time: None,
            parent_id: None,
            size: None,
        }
    }

    #[test]
    fn test_folder_detection_and_uri() {
        let folder = entry(FOLDER_MIME_TYPE);
        assert!(folder.is_folder());
        assert_eq!(folder.uri(), "gdrive:///abc123");
        assert!(!entry("text/plain").is_folder());
    }

    #[test]
    fn test_entry_serializes_camel_case_without_empty_fields() {
        let json = serde_json::to_value(entry("text/plain")).unwrap();
        assert_eq!(json["mimeType"], "text/plain");
        assert!(json.get("parentId").is_none());
        assert!(json.get("modifiedTime").is_none());
    }

    #[test]
    fn test_page_token_is_transparent() {
        let token = PageToken::new("opaque");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"opaque\"");
        assert_eq!(token.to_string(), "opaque");
    }
}
