//! Normalized file content

use serde::{Deserialize, Serialize};

use crate::FileEntry;

/// Text format a payload was converted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    Markdown,
    Csv,
    PlainText,
    JsonPretty,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Csv => "csv",
            ExportFormat::PlainText => "plain-text",
            ExportFormat::JsonPretty => "json-pretty",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of reading a file, reduced to a text-shaped value
///
/// Which variant applies depends only on the file's MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPayload {
    PlainText { text: String },
    ExportedText { format: ExportFormat, text: String },
    BinaryBase64 { data: String },
}

impl ContentPayload {
    /// The payload body regardless of variant
    pub fn as_text(&self) -> &str {
        match self {
            ContentPayload::PlainText { text } => text,
            ContentPayload::ExportedText { text, .. } => text,
            ContentPayload::BinaryBase64 { data } => data,
        }
    }

    pub fn export_format(&self) -> Option<ExportFormat> {
        match self {
            ContentPayload::ExportedText { format, .. } => Some(*format),
            _ => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, ContentPayload::BinaryBase64 { .. })
    }
}

/// File metadata together with its normalized content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub file: FileEntry,
    pub payload: ContentPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_tagging() {
        let payload = ContentPayload::ExportedText {
            format: ExportFormat::JsonPretty,
            text: "{}".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "exported_text");
        assert_eq!(json["format"], "json-pretty");

        let binary: ContentPayload =
            serde_json::from_str(r#"{"type":"binary_base64","data":"AAE="}"#).unwrap();
        assert!(binary.is_binary());
        assert_eq!(binary.as_text(), "AAE=");
        assert_eq!(binary.export_format(), None);
    }
}
