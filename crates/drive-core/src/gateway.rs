//! Operation dispatch
//!
//! Each operation validates and clamps its parameters, builds the remote
//! query, calls the transport once and normalizes the response. The
//! gateway keeps no state between calls besides the shared transport.

use std::sync::Arc;

use drive_types::{
    ContentPayload, FileContent, FileEntry, FilePage, PageToken, UploadRequest, FOLDER_MIME_TYPE,
    RECENT_FILES_LIMIT,
};
use tracing::{debug, info};

use crate::classifier::{self, ContentStrategy};
use crate::config::GatewayConfig;
use crate::cursor::{self, CursorScope};
use crate::error::{GatewayError, Result};
use crate::normalizer;
use crate::ports::{DriveTransport, ListQuery, NewFile, UploadBody};
use crate::query;

/// Page size used when the caller gives none
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for `list` pages
pub const MAX_LIST_PAGE_SIZE: u32 = 1000;

/// Upper bound for `search` pages; full-text search is expensive remotely
pub const MAX_SEARCH_PAGE_SIZE: u32 = 100;

/// Upper bound for the recent view
pub const MAX_RECENT_LIMIT: u32 = 1000;

/// Clamp a requested size into `[1, max]`, defaulting when absent
pub fn clamp_page_size(requested: Option<i64>, default: u32, max: u32) -> u32 {
    requested
        .unwrap_or(i64::from(default))
        .clamp(1, i64::from(max)) as u32
}

fn validate_id(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(GatewayError::invalid_argument(format!(
            "{} must not be empty",
            field
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(GatewayError::invalid_argument(format!(
            "{} is not a valid file ID: {:?}",
            field, value
        )));
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::invalid_argument(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Content gateway over an injected transport
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn DriveTransport>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(transport: Arc<dyn DriveTransport>) -> Self {
        Self::with_config(transport, GatewayConfig::default())
    }

    pub fn with_config(transport: Arc<dyn DriveTransport>, config: GatewayConfig) -> Self {
        Self { transport, config }
    }

    /// List files, optionally filtered by a case-insensitive name substring.
    ///
    /// A `cursor` must come from an earlier `list` call with the same
    /// `name_filter`.
    pub async fn list(
        &self,
        page_size: Option<i64>,
        cursor: Option<&PageToken>,
        name_filter: Option<&str>,
    ) -> Result<FilePage> {
        let page_size = clamp_page_size(page_size, DEFAULT_PAGE_SIZE, MAX_LIST_PAGE_SIZE);
        let filter = non_empty(name_filter);
        let scope = CursorScope::List {
            filter: filter.clone(),
        };
        let page_token = cursor.map(|c| cursor::redeem(c, &scope)).transpose()?;

        let q = query::list_query(filter.as_deref());
        debug!(q = %q, page_size, resumed = page_token.is_some(), "Listing files");

        let response = self
            .transport
            .list_files(&ListQuery {
                q,
                page_size,
                page_token,
                order_by: None,
            })
            .await?;
        let mut page = normalizer::to_page(response, &scope)?;

        if let Some(filter) = filter {
            let needle = filter.to_lowercase();
            page.entries
                .retain(|entry| entry.name.to_lowercase().contains(&needle));
        }

        Ok(page)
    }

    /// Search names and extracted full text. Ranking is left to the store.
    pub async fn search(
        &self,
        search: &str,
        page_size: Option<i64>,
        cursor: Option<&PageToken>,
    ) -> Result<FilePage> {
        let search = search.trim();
        if search.is_empty() {
            return Err(GatewayError::invalid_argument("search query must not be empty"));
        }

        let page_size = clamp_page_size(page_size, DEFAULT_PAGE_SIZE, MAX_SEARCH_PAGE_SIZE);
        let scope = CursorScope::Search {
            query: search.to_string(),
        };
        let page_token = cursor.map(|c| cursor::redeem(c, &scope)).transpose()?;

        let q = query::search_query(search);
        debug!(q = %q, page_size, resumed = page_token.is_some(), "Searching files");

        let response = self
            .transport
            .list_files(&ListQuery {
                q,
                page_size,
                page_token,
                order_by: None,
            })
            .await?;
        normalizer::to_page(response, &scope)
    }

    /// Read a file's content, shaped by its MIME type
    pub async fn read(&self, file_id: &str) -> Result<ContentPayload> {
        Ok(self.read_file(file_id).await?.payload)
    }

    /// Read a file's metadata and content together
    pub async fn read_file(&self, file_id: &str) -> Result<FileContent> {
        validate_id("file_id", file_id)?;

        let mut meta = self.transport.get_metadata(file_id).await?;
        if meta.id.is_empty() {
            meta.id = file_id.to_string();
        }
        let file = normalizer::created_entry(meta)?;

        let strategy = classifier::classify(&file.mime_type);

        let limit = self.config.max_download_bytes;
        if let Some(size) = file.size {
            if size > limit {
                return Err(GatewayError::PayloadTooLarge { size, limit });
            }
        }

        debug!(file_id, mime_type = %file.mime_type, strategy = ?strategy, "Reading file");

        let bytes = if strategy.is_download() {
            self.transport.get_content(file_id).await?
        } else if let ContentStrategy::Export(target) = &strategy {
            self.transport
                .export_file(file_id, target.mime_type())
                .await?
        } else {
            return Err(GatewayError::UnsupportedExport(file.mime_type));
        };

        let size = bytes.len() as u64;
        if size > limit {
            return Err(GatewayError::PayloadTooLarge { size, limit });
        }

        let payload = normalizer::to_payload(&strategy, &bytes)?;
        Ok(FileContent { file, payload })
    }

    /// Create a new file. Existing files with the same name are untouched.
    pub async fn upload(&self, request: &UploadRequest) -> Result<FileEntry> {
        validate_name("name", &request.name)?;
        if request.mime_type.trim().is_empty() {
            return Err(GatewayError::invalid_argument("mime_type must not be empty"));
        }
        if let Some(parent) = &request.parent_id {
            validate_id("parent_id", parent)?;
        }

        let body = if classifier::uploads_as_base64(&request.mime_type) {
            UploadBody::Base64(request.content.clone())
        } else {
            UploadBody::Text(request.content.clone())
        };
        let metadata = NewFile {
            name: request.name.clone(),
            mime_type: request.mime_type.clone(),
            parents: request.parent_id.iter().cloned().collect(),
        };

        let created = self.transport.create_file(&metadata, &body).await?;
        let entry = normalizer::created_entry(created)?;
        info!(id = %entry.id, name = %entry.name, base64 = body.is_base64(), "Uploaded file");
        Ok(entry)
    }

    /// Create a folder, at the root or under `parent_id`
    pub async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<FileEntry> {
        validate_name("folder name", name)?;
        if let Some(parent) = parent_id {
            validate_id("parent_id", parent)?;
        }

        let metadata = NewFile {
            name: name.to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            parents: parent_id.into_iter().map(str::to_string).collect(),
        };

        let created = self.transport.create_folder(&metadata).await?;
        let entry = normalizer::created_entry(created)?;
        info!(id = %entry.id, name = %entry.name, "Created folder");
        Ok(entry)
    }

    /// Most recently modified files first, at most `limit` of them
    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<FileEntry>> {
        let limit = clamp_page_size(limit, RECENT_FILES_LIMIT, MAX_RECENT_LIMIT);
        debug!(limit, "Listing recent files");

        let response = self
            .transport
            .list_files(&ListQuery {
                q: query::NOT_TRASHED.to_string(),
                page_size: limit,
                page_token: None,
                order_by: Some(query::RECENT_ORDER.to_string()),
            })
            .await?;

        let mut entries = normalizer::to_entries(response.files);
        entries.truncate(limit as usize);
        Ok(entries)
    }

    /// The fixed recent files resource
    pub async fn recent_files_resource(&self) -> Result<Vec<FileEntry>> {
        self.recent(Some(i64::from(RECENT_FILES_LIMIT))).await
    }
}
