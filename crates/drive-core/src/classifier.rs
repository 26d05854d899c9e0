//! MIME type classification
//!
//! The single table deciding how a file's bytes become a caller-facing
//! payload. Nothing else in the gateway branches on MIME strings.

use drive_types::ExportFormat;

/// Prefix shared by the store's native (non-downloadable) document types
pub const NATIVE_PREFIX: &str = "application/vnd.google-apps.";

/// Non-`text/*` types that hold source code or markup
const SOURCE_TYPES: &[&str] = &[
    "application/javascript",
    "application/x-javascript",
    "application/typescript",
    "application/x-sh",
    "application/x-python",
    "application/x-python-code",
    "application/xml",
    "application/x-yaml",
    "application/yaml",
    "application/toml",
    "application/sql",
    "application/x-httpd-php",
    "application/graphql",
];

/// Server-side conversion for a native document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportTarget {
    Markdown,
    Csv,
    PlainText,
    Png,
}

impl ExportTarget {
    /// MIME type requested from the store's export endpoint
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportTarget::Markdown => "text/markdown",
            ExportTarget::Csv => "text/csv",
            ExportTarget::PlainText => "text/plain",
            ExportTarget::Png => "image/png",
        }
    }

    /// Text format of the exported bytes; `None` for image exports, which
    /// are returned base64-encoded
    pub fn text_format(&self) -> Option<ExportFormat> {
        match self {
            ExportTarget::Markdown => Some(ExportFormat::Markdown),
            ExportTarget::Csv => Some(ExportFormat::Csv),
            ExportTarget::PlainText => Some(ExportFormat::PlainText),
            ExportTarget::Png => None,
        }
    }
}

/// How a file's content is fetched and shaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentStrategy {
    /// Raw download decoded as UTF-8
    PlainText,
    /// Raw download re-serialized as indented JSON
    Json,
    /// Server-side export of a native document
    Export(ExportTarget),
    /// Native document with no configured export target
    Unexportable(String),
    /// Raw download encoded as base64
    Binary,
}

impl ContentStrategy {
    /// Whether the content is fetched with a plain download
    pub fn is_download(&self) -> bool {
        matches!(
            self,
            ContentStrategy::PlainText | ContentStrategy::Json | ContentStrategy::Binary
        )
    }
}

/// Lowercase the type and drop parameters such as `; charset=utf-8`
pub fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Map a MIME type to its content strategy
pub fn classify(mime_type: &str) -> ContentStrategy {
    let mime = essence(mime_type);

    if let Some(native) = mime.strip_prefix(NATIVE_PREFIX) {
        return match native {
            "document" => ContentStrategy::Export(ExportTarget::Markdown),
            "spreadsheet" => ContentStrategy::Export(ExportTarget::Csv),
            "presentation" => ContentStrategy::Export(ExportTarget::PlainText),
            "drawing" => ContentStrategy::Export(ExportTarget::Png),
            _ => ContentStrategy::Unexportable(mime),
        };
    }

    if mime == "application/json" || mime.ends_with("+json") {
        return ContentStrategy::Json;
    }

    if mime.starts_with("text/") || SOURCE_TYPES.contains(&mime.as_str()) {
        return ContentStrategy::PlainText;
    }

    ContentStrategy::Binary
}

/// Whether upload content for this type arrives base64-encoded
pub fn uploads_as_base64(mime_type: &str) -> bool {
    classify(mime_type) == ContentStrategy::Binary
}
