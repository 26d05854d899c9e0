//! In-memory transport
//!
//! Emulates the remote store closely enough for tests and offline runs:
//! insertion-ordered files, store-issued page tokens, the `contains`
//! clauses of the query syntax the gateway emits, exports of native
//! documents and base64 upload decoding.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::ports::{
    DriveTransport, ListQuery, NewFile, RemoteFile, RemoteFileList, TransportError, UploadBody,
};

/// A file held by [`MemoryDrive`]
#[derive(Debug, Clone)]
pub struct MemoryFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
    /// Export results keyed by requested MIME type
    pub exports: HashMap<String, Vec<u8>>,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub parents: Vec<String>,
    pub trashed: bool,
    /// When false, reads fail with permission denied
    pub readable: bool,
}

impl MemoryFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
            exports: HashMap::new(),
            created_time: now,
            modified_time: now,
            parents: Vec::new(),
            trashed: false,
            readable: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn modified_at(mut self, time: DateTime<Utc>) -> Self {
        self.modified_time = time;
        self
    }

    pub fn in_folder(mut self, parent_id: impl Into<String>) -> Self {
        self.parents = vec![parent_id.into()];
        self
    }

    pub fn with_export(
        mut self,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.exports.insert(mime_type.into(), bytes.into());
        self
    }

    pub fn trashed(mut self) -> Self {
        self.trashed = true;
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.readable = false;
        self
    }

    fn is_native(&self) -> bool {
        self.mime_type.starts_with("application/vnd.google-apps.")
    }

    fn to_remote(&self) -> RemoteFile {
        RemoteFile {
            id: self.id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: (!self.is_native()).then(|| self.content.len().to_string()),
            created_time: Some(self.created_time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            modified_time: Some(self.modified_time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            parents: self.parents.clone(),
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

const TOKEN_PREFIX: &str = "mem-page-";

/// Page tokens kept resumable; older ones report expiry
const MAX_LIVE_PAGE_TOKENS: usize = 1024;

/// Position a page token resumes from
struct IssuedToken {
    q: String,
    order_by: Option<String>,
    offset: usize,
}

#[derive(Default)]
struct State {
    files: Vec<MemoryFile>,
    tokens: HashMap<String, IssuedToken>,
    /// Tokens numbered up to here are expired
    expired_through: u64,
    next_token: u64,
    failure: Option<TransportError>,
}

impl State {
    fn is_expired(&self, token: &str) -> bool {
        token
            .strip_prefix(TOKEN_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .is_some_and(|n| n <= self.expired_through)
    }

    /// Tokens are issued in sequence, so the oldest live one follows
    /// `expired_through`
    fn evict_oldest_tokens(&mut self) {
        while self.tokens.len() > MAX_LIVE_PAGE_TOKENS {
            self.expired_through += 1;
            let oldest = format!("{}{}", TOKEN_PREFIX, self.expired_through);
            self.tokens.remove(&oldest);
        }
    }
}

/// Transport backed by process memory
#[derive(Default)]
pub struct MemoryDrive {
    state: Mutex<State>,
}

impl MemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file; returns its id
    pub fn insert(&self, file: MemoryFile) -> String {
        let id = file.id.clone();
        self.lock().files.push(file);
        id
    }

    pub fn with_files(self, files: impl IntoIterator<Item = MemoryFile>) -> Self {
        for file in files {
            self.insert(file);
        }
        self
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    /// Make every outstanding page token report expiry
    pub fn expire_page_tokens(&self) {
        let mut state = self.lock();
        state.tokens.clear();
        state.expired_through = state.next_token;
    }

    /// Fail the next call with `error`
    pub fn fail_next(&self, error: TransportError) {
        self.lock().failure = Some(error);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-call
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_failure(state: &mut State) -> Result<(), TransportError> {
        match state.failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn readable<'a>(state: &'a State, file_id: &str) -> Result<&'a MemoryFile, TransportError> {
        let file = state
            .files
            .iter()
            .find(|f| f.id == file_id)
            .ok_or_else(|| TransportError::NotFound(format!("File not found: {}", file_id)))?;
        if !file.readable {
            return Err(TransportError::PermissionDenied(format!(
                "The user does not have sufficient permissions for file {}",
                file_id
            )));
        }
        Ok(file)
    }

    fn check_parents(state: &State, parents: &[String]) -> Result<(), TransportError> {
        for parent in parents {
            if parent != "root" && !state.files.iter().any(|f| &f.id == parent) {
                return Err(TransportError::NotFound(format!("File not found: {}", parent)));
            }
        }
        Ok(())
    }
}

/// A `<field> contains '<literal>'` clause
#[derive(Debug, PartialEq, Eq)]
struct Clause {
    field: String,
    literal: String,
}

/// Extract the `contains` clauses of a query, unescaping literals
fn contains_clauses(q: &str) -> Vec<Clause> {
    let mut clauses = Vec::new();
    let mut rest = q;

    while let Some(pos) = rest.find(" contains '") {
        let field = rest[..pos]
            .rsplit(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or_default()
            .to_string();

        let mut literal = String::new();
        let mut chars = rest[pos + " contains '".len()..].char_indices();
        let mut consumed = rest.len() - pos - " contains '".len();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        literal.push(escaped);
                    }
                }
                '\'' => {
                    consumed = i + 1;
                    break;
                }
                _ => literal.push(c),
            }
        }

        clauses.push(Clause { field, literal });
        rest = &rest[pos + " contains '".len() + consumed..];
    }

    clauses
}

fn query_matches(file: &MemoryFile, q: &str, clauses: &[Clause]) -> bool {
    if q.contains("trashed = false") && file.trashed {
        return false;
    }

    let hit = |clause: &Clause| {
        let needle = clause.literal.to_lowercase();
        match clause.field.as_str() {
            "name" => file.name.to_lowercase().contains(&needle),
            "fullText" => {
                !file.is_native()
                    && String::from_utf8_lossy(&file.content)
                        .to_lowercase()
                        .contains(&needle)
            }
            _ => false,
        }
    };

    if clauses.iter().any(|c| c.field == "fullText") {
        clauses.iter().any(hit)
    } else {
        clauses.iter().all(hit)
    }
}

#[async_trait]
impl DriveTransport for MemoryDrive {
    async fn get_metadata(&self, file_id: &str) -> Result<RemoteFile, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        let file = state
            .files
            .iter()
            .find(|f| f.id == file_id)
            .ok_or_else(|| TransportError::NotFound(format!("File not found: {}", file_id)))?;
        Ok(file.to_remote())
    }

    async fn list_files(&self, query: &ListQuery) -> Result<RemoteFileList, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;

        let offset = match &query.page_token {
            None => 0,
            Some(token) if state.is_expired(token) => {
                return Err(TransportError::ExpiredPageToken(token.clone()))
            }
            Some(token) => {
                let issued = state
                    .tokens
                    .get(token)
                    .ok_or_else(|| TransportError::InvalidPageToken(token.clone()))?;
                if issued.q != query.q || issued.order_by != query.order_by {
                    return Err(TransportError::InvalidPageToken(token.clone()));
                }
                issued.offset
            }
        };

        let clauses = contains_clauses(&query.q);
        let mut hits: Vec<&MemoryFile> = state
            .files
            .iter()
            .filter(|f| query_matches(f, &query.q, &clauses))
            .collect();
        if query.order_by.as_deref() == Some("modifiedTime desc") {
            hits.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        }

        let page_size = query.page_size.max(1) as usize;
        let files: Vec<RemoteFile> = hits
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|f| f.to_remote())
            .collect();
        let next_offset = offset + files.len();
        let has_more = next_offset < hits.len();

        let next_page_token = if has_more {
            state.next_token += 1;
            let token = format!("{}{}", TOKEN_PREFIX, state.next_token);
            state.tokens.insert(
                token.clone(),
                IssuedToken {
                    q: query.q.clone(),
                    order_by: query.order_by.clone(),
                    offset: next_offset,
                },
            );
            state.evict_oldest_tokens();
            Some(token)
        } else {
            None
        };

        Ok(RemoteFileList {
            files,
            next_page_token,
        })
    }

    async fn get_content(&self, file_id: &str) -> Result<Bytes, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        let file = Self::readable(&state, file_id)?;
        if file.is_native() {
            return Err(TransportError::Rejected(
                "Only files with binary content can be downloaded. Use Export with Docs Editors files."
                    .to_string(),
            ));
        }
        Ok(Bytes::from(file.content.clone()))
    }

    async fn export_file(&self, file_id: &str, export_mime: &str) -> Result<Bytes, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        let file = Self::readable(&state, file_id)?;
        file.exports
            .get(export_mime)
            .map(|bytes| Bytes::from(bytes.clone()))
            .ok_or_else(|| {
                TransportError::Rejected(format!(
                    "Export to {} is not supported for {}",
                    export_mime, file.mime_type
                ))
            })
    }

    async fn create_file(
        &self,
        metadata: &NewFile,
        body: &UploadBody,
    ) -> Result<RemoteFile, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        Self::check_parents(&state, &metadata.parents)?;

        let content = match body {
            UploadBody::Text(text) => text.as_bytes().to_vec(),
            UploadBody::Base64(data) => STANDARD
                .decode(data.trim())
                .map_err(|e| TransportError::Rejected(format!("Malformed base64 media: {}", e)))?,
        };

        let mut file = MemoryFile::new(metadata.name.clone(), metadata.mime_type.clone(), content);
        file.parents = metadata.parents.clone();
        let remote = file.to_remote();
        state.files.push(file);
        Ok(remote)
    }

    async fn create_folder(&self, metadata: &NewFile) -> Result<RemoteFile, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        Self::check_parents(&state, &metadata.parents)?;

        let mut folder = MemoryFile::new(metadata.name.clone(), metadata.mime_type.clone(), Vec::new());
        folder.parents = metadata.parents.clone();
        let remote = folder.to_remote();
        state.files.push(folder);
        Ok(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_clauses() {
        let clauses =
            contains_clauses("(name contains 'it\\'s' or fullText contains 'x') and trashed = false");
        assert_eq!(
            clauses,
            vec![
                Clause {
                    field: "name".into(),
                    literal: "it's".into()
                },
                Clause {
                    field: "fullText".into(),
                    literal: "x".into()
                },
            ]
        );
        assert!(contains_clauses("trashed = false").is_empty());
    }

    #[tokio::test]
    async fn test_pages_and_tokens() {
        let drive = MemoryDrive::new().with_files(
            (0..5).map(|i| MemoryFile::new(format!("file{}.txt", i), "text/plain", "x")),
        );
        let query = ListQuery {
            q: "trashed = false".into(),
            page_size: 2,
            page_token: None,
            order_by: None,
        };
        let first = drive.list_files(&query).await.unwrap();
        assert_eq!(first.files.len(), 2);
        let token = first.next_page_token.unwrap();

        let second = drive
            .list_files(&ListQuery {
                page_token: Some(token.clone()),
                ..query.clone()
            })
            .await
            .unwrap();
        assert_eq!(second.files[0].name, "file2.txt");

        let mismatched = drive
            .list_files(&ListQuery {
                q: "name contains 'file' and trashed = false".into(),
                page_token: Some(token.clone()),
                ..query.clone()
            })
            .await;
        assert!(matches!(mismatched, Err(TransportError::InvalidPageToken(_))));

        drive.expire_page_tokens();
        let expired = drive
            .list_files(&ListQuery {
                page_token: Some(token),
                ..query
            })
            .await;
        assert!(matches!(expired, Err(TransportError::ExpiredPageToken(_))));
    }

    #[tokio::test]
    async fn test_page_tokens_are_bounded() {
        let drive = MemoryDrive::new().with_files(
            (0..3).map(|i| MemoryFile::new(format!("file{}.txt", i), "text/plain", "x")),
        );
        let query = ListQuery {
            q: "trashed = false".into(),
            page_size: 1,
            page_token: None,
            order_by: None,
        };

        let first = drive.list_files(&query).await.unwrap();
        let oldest = first.next_page_token.unwrap();
        for _ in 0..MAX_LIVE_PAGE_TOKENS {
            drive.list_files(&query).await.unwrap();
        }
        assert_eq!(drive.lock().tokens.len(), MAX_LIVE_PAGE_TOKENS);

        let evicted = drive
            .list_files(&ListQuery {
                page_token: Some(oldest),
                ..query.clone()
            })
            .await;
        assert!(matches!(evicted, Err(TransportError::ExpiredPageToken(_))));

        let newest = drive.list_files(&query).await.unwrap().next_page_token;
        assert!(drive
            .list_files(&ListQuery {
                page_token: newest,
                ..query
            })
            .await
            .is_ok());
    }

    #[test]
    fn test_injected_failure_is_consumed() {
        let drive = MemoryDrive::new();
        drive.fail_next(TransportError::Unavailable("503".into()));
        assert!(tokio_test::block_on(drive.get_metadata("x")).is_err());
        assert!(matches!(
            tokio_test::block_on(drive.get_metadata("x")),
            Err(TransportError::NotFound(_))
        ));
    }
}
