//! Conversion of remote responses into caller-facing shapes

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use drive_types::{ContentPayload, ExportFormat, FileEntry, FilePage};
use tracing::{debug, warn};

use crate::classifier::ContentStrategy;
use crate::cursor::{self, CursorScope};
use crate::error::{GatewayError, Result};
use crate::ports::{RemoteFile, RemoteFileList};

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            debug!(value = raw, error = %e, "Ignoring unparseable timestamp");
            None
        }
    }
}

/// Convert one record; `None` when the store sent no id
pub fn to_entry(file: RemoteFile) -> Option<FileEntry> {
    if file.id.trim().is_empty() {
        return None;
    }

    let size = file.size.as_deref().and_then(|s| s.parse::<u64>().ok());
    let modified_time = parse_time(file.modified_time.as_deref());
    let created_time = parse_time(file.created_time.as_deref());

    Some(FileEntry {
        id: file.id,
        name: file.name,
        mime_type: file.mime_type,
        modified_time,
        created_time,
        parent_id: file.parents.into_iter().next(),
        size,
    })
}

/// Convert a record returned by a create call; a missing id is an error
pub fn created_entry(file: RemoteFile) -> Result<FileEntry> {
    to_entry(file).ok_or_else(|| {
        GatewayError::RemoteUnavailable("remote store returned a record without an id".to_string())
    })
}

/// Convert records preserving the store's order, dropping any without an id
pub fn to_entries(files: Vec<RemoteFile>) -> Vec<FileEntry> {
    let total = files.len();
    let entries: Vec<FileEntry> = files.into_iter().filter_map(to_entry).collect();
    if entries.len() < total {
        warn!(
            dropped = total - entries.len(),
            "Dropped remote records without an id"
        );
    }
    entries
}

/// Convert a listing response into a page with a scoped cursor
pub fn to_page(list: RemoteFileList, scope: &CursorScope) -> Result<FilePage> {
    let next_cursor = match list.next_page_token.as_deref() {
        Some(token) if !token.is_empty() => Some(cursor::issue(scope, token)?),
        _ => None,
    };

    Ok(FilePage {
        entries: to_entries(list.files),
        next_cursor,
    })
}

fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn pretty_json(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Shape fetched bytes according to the strategy that fetched them
pub fn to_payload(strategy: &ContentStrategy, bytes: &[u8]) -> Result<ContentPayload> {
    let payload = match strategy {
        ContentStrategy::PlainText => ContentPayload::PlainText {
            text: decode_text(bytes),
        },
        ContentStrategy::Json => {
            let text = pretty_json(bytes).unwrap_or_else(|| {
                warn!("JSON file did not parse, returning its text unformatted");
                decode_text(bytes)
            });
            ContentPayload::ExportedText {
                format: ExportFormat::JsonPretty,
                text,
            }
        }
        ContentStrategy::Export(target) => match target.text_format() {
            Some(format) => ContentPayload::ExportedText {
                format,
                text: decode_text(bytes),
            },
            None => ContentPayload::BinaryBase64 {
                data: STANDARD.encode(bytes),
            },
        },
        ContentStrategy::Binary => ContentPayload::BinaryBase64 {
            data: STANDARD.encode(bytes),
        },
        ContentStrategy::Unexportable(mime) => {
            return Err(GatewayError::UnsupportedExport(mime.clone()))
        }
    };
    Ok(payload)
}
