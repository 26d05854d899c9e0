//! Google Drive v3 transport
//!
//! Talks to the Drive REST API with a bearer token:
//! - `GET  /files/{id}` - metadata
//! - `GET  /files` - listing and full-text search
//! - `GET  /files/{id}?alt=media` - raw download
//! - `GET  /files/{id}/export` - server-side conversion of native documents
//! - `POST /upload/.../files?uploadType=multipart` - file creation
//! - `POST /files` - folder creation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use drive_core::ports::{
    DriveTransport, ListQuery, NewFile, RemoteFile, RemoteFileList, TransportError, UploadBody,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::auth::{StaticToken, TokenSource};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Metadata fields requested for single records
const FILE_FIELDS: &str = "id,name,mimeType,size,createdTime,modifiedTime,parents";

/// Metadata fields requested for listings
const LIST_FIELDS: &str =
    "nextPageToken,files(id,name,mimeType,size,createdTime,modifiedTime,parents)";

/// Connection settings for [`GoogleDriveTransport`]
#[derive(Debug, Clone)]
pub struct GoogleDriveConfig {
    pub api_base: String,
    pub upload_base: String,
    pub timeout: Duration,
}

impl Default for GoogleDriveConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Drive REST client implementing the gateway's transport port
pub struct GoogleDriveTransport {
    http: ReqwestClient,
    config: GoogleDriveConfig,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleDriveTransport {
    pub fn new(
        config: GoogleDriveConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, TransportError> {
        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Unavailable(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Build a transport around a fixed access token
    pub fn with_access_token(
        config: GoogleDriveConfig,
        access_token: impl Into<String>,
    ) -> Result<Self, TransportError> {
        Self::new(config, Arc::new(StaticToken::new(access_token)))
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.config.api_base.trim_end_matches('/'), file_id)
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.config.api_base.trim_end_matches('/'))
    }

    fn upload_url(&self) -> String {
        format!("{}/files", self.config.upload_base.trim_end_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, &body))
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(map_request_error)?;
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn send_bytes(&self, request: RequestBuilder) -> Result<Bytes, TransportError> {
        let response = self.send(request).await?;
        response.bytes().await.map_err(map_request_error)
    }
}

#[async_trait]
impl DriveTransport for GoogleDriveTransport {
    async fn get_metadata(&self, file_id: &str) -> Result<RemoteFile, TransportError> {
        debug!(file_id, "GET file metadata");
        let request = self.http.get(self.file_url(file_id)).query(&[
            ("fields", FILE_FIELDS),
            ("supportsAllDrives", "true"),
        ]);
        self.send_json(request).await
    }

    async fn list_files(&self, query: &ListQuery) -> Result<RemoteFileList, TransportError> {
        debug!(q = %query.q, page_size = query.page_size, "GET files");
        let page_size = query.page_size.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", query.q.as_str()),
            ("pageSize", page_size.as_str()),
            ("fields", LIST_FIELDS),
        ];
        if let Some(token) = &query.page_token {
            params.push(("pageToken", token.as_str()));
        }
        if let Some(order_by) = &query.order_by {
            params.push(("orderBy", order_by.as_str()));
        }

        let request = self.http.get(self.files_url()).query(&params);
        self.send_json(request).await
    }

    async fn get_content(&self, file_id: &str) -> Result<Bytes, TransportError> {
        debug!(file_id, "GET file media");
        let request = self
            .http
            .get(self.file_url(file_id))
            .query(&[("alt", "media"), ("supportsAllDrives", "true")]);
        self.send_bytes(request).await
    }

    async fn export_file(&self, file_id: &str, export_mime: &str) -> Result<Bytes, TransportError> {
        debug!(file_id, export_mime, "GET file export");
        let request = self
            .http
            .get(format!("{}/export", self.file_url(file_id)))
            .query(&[("mimeType", export_mime)]);
        self.send_bytes(request).await
    }

    async fn create_file(
        &self,
        metadata: &NewFile,
        body: &UploadBody,
    ) -> Result<RemoteFile, TransportError> {
        debug!(name = %metadata.name, mime_type = %metadata.mime_type, "POST multipart upload");
        let boundary = format!("drive-gateway-{}", uuid::Uuid::new_v4().simple());
        let payload = multipart_body(&boundary, metadata, body)?;

        let request = self
            .http
            .post(self.upload_url())
            .query(&[
                ("uploadType", "multipart"),
                ("fields", FILE_FIELDS),
                ("supportsAllDrives", "true"),
            ])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(payload);
        self.send_json(request).await
    }

    async fn create_folder(&self, metadata: &NewFile) -> Result<RemoteFile, TransportError> {
        debug!(name = %metadata.name, "POST folder");
        let request = self
            .http
            .post(self.files_url())
            .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")])
            .json(metadata);
        self.send_json(request).await
    }
}

/// Build a `multipart/related` body: JSON metadata followed by the media
///
/// Base64 content is declared with `Content-Transfer-Encoding: base64` so
/// the store decodes it; malformed input is rejected remotely.
pub fn multipart_body(
    boundary: &str,
    metadata: &NewFile,
    body: &UploadBody,
) -> Result<Vec<u8>, TransportError> {
    let metadata_json =
        serde_json::to_string(metadata).map_err(|e| TransportError::Decode(e.to_string()))?;

    let mut out = String::new();
    out.push_str(&format!("--{}\r\n", boundary));
    out.push_str("Content-Type: application/json; charset=UTF-8\r\n\r\n");
    out.push_str(&metadata_json);
    out.push_str("\r\n");

    out.push_str(&format!("--{}\r\n", boundary));
    out.push_str(&format!("Content-Type: {}\r\n", metadata.mime_type));
    if body.is_base64() {
        out.push_str("Content-Transfer-Encoding: base64\r\n");
    }
    out.push_str("\r\n");
    out.push_str(body.as_str());
    out.push_str("\r\n");
    out.push_str(&format!("--{}--\r\n", boundary));

    Ok(out.into_bytes())
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    location: String,
}

const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "sharingRateLimitExceeded",
];

/// Map a non-success HTTP response onto a transport error
pub fn map_status(status: StatusCode, body: &str) -> TransportError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let message = if envelope.error.message.is_empty() {
        status.to_string()
    } else {
        envelope.error.message.clone()
    };
    let has_reason = |wanted: &[&str]| {
        envelope
            .error
            .errors
            .iter()
            .any(|d| wanted.contains(&d.reason.as_str()))
    };

    match status {
        StatusCode::NOT_FOUND => TransportError::NotFound(message),
        StatusCode::UNAUTHORIZED => TransportError::Unauthenticated(message),
        StatusCode::FORBIDDEN if has_reason(RATE_LIMIT_REASONS) => {
            TransportError::RateLimited(message)
        }
        StatusCode::FORBIDDEN => TransportError::PermissionDenied(message),
        StatusCode::GONE => TransportError::ExpiredPageToken(message),
        StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited(message),
        StatusCode::BAD_REQUEST => {
            let page_token = envelope
                .error
                .errors
                .iter()
                .any(|d| d.location == "pageToken")
                || message.contains("pageToken");
            if page_token {
                TransportError::InvalidPageToken(message)
            } else {
                TransportError::Rejected(message)
            }
        }
        s if s.is_server_error() => TransportError::Unavailable(message),
        _ => TransportError::Rejected(message),
    }
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    if e.is_decode() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_body(code: u16, reason: &str, location: &str, message: &str) -> String {
        serde_json::json!({
            "error": {
                "code": code,
                "message": message,
                "errors": [{ "reason": reason, "location": location, "message": message }]
            }
        })
        .to_string()
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, &error_body(404, "notFound", "fileId", "File not found: x.")),
            TransportError::NotFound(m) if m == "File not found: x."
        ));
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, ""),
            TransportError::Unauthenticated(_)
        ));
        assert!(matches!(
            map_status(
                StatusCode::FORBIDDEN,
                &error_body(403, "insufficientFilePermissions", "", "denied")
            ),
            TransportError::PermissionDenied(_)
        ));
        assert!(matches!(
            map_status(
                StatusCode::FORBIDDEN,
                &error_body(403, "userRateLimitExceeded", "", "slow down")
            ),
            TransportError::RateLimited(_)
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, ""),
            TransportError::RateLimited(_)
        ));
        assert!(matches!(
            map_status(StatusCode::SERVICE_UNAVAILABLE, "<html>"),
            TransportError::Unavailable(_)
        ));
        assert!(matches!(
            map_status(StatusCode::GONE, ""),
            TransportError::ExpiredPageToken(_)
        ));
    }

    #[test]
    fn test_bad_request_distinguishes_page_token() {
        assert!(matches!(
            map_status(
                StatusCode::BAD_REQUEST,
                &error_body(400, "invalid", "pageToken", "Invalid Value")
            ),
            TransportError::InvalidPageToken(_)
        ));
        assert!(matches!(
            map_status(
                StatusCode::BAD_REQUEST,
                &error_body(400, "badContent", "", "Media type not supported")
            ),
            TransportError::Rejected(_)
        ));
    }

    #[test]
    fn test_multipart_body_text() {
        let meta = NewFile {
            name: "notes.txt".into(),
            mime_type: "text/plain".into(),
            parents: vec!["folder1".into()],
        };
        let body = multipart_body("b1", &meta, &UploadBody::Text("Hello world".into())).unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("--b1\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"));
        assert!(text.contains(r#""name":"notes.txt""#));
        assert!(text.contains(r#""parents":["folder1"]"#));
        assert!(text.contains("Content-Type: text/plain\r\n\r\nHello world\r\n"));
        assert!(!text.contains("Content-Transfer-Encoding"));
        assert!(text.ends_with("--b1--\r\n"));
    }

    #[test]
    fn test_multipart_body_base64() {
        let meta = NewFile {
            name: "logo.png".into(),
            mime_type: "image/png".into(),
            parents: vec![],
        };
        let body = multipart_body("b2", &meta, &UploadBody::Base64("iVBORw0KGgo=".into())).unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains(
            "Content-Type: image/png\r\nContent-Transfer-Encoding: base64\r\n\r\niVBORw0KGgo=\r\n"
        ));
    }

    #[test]
    fn test_urls_tolerate_trailing_slash() {
        let transport = GoogleDriveTransport::with_access_token(
            GoogleDriveConfig {
                api_base: "http://localhost:9000/drive/v3/".into(),
                ..GoogleDriveConfig::default()
            },
            "token",
        )
        .unwrap();
        assert_eq!(transport.file_url("abc"), "http://localhost:9000/drive/v3/files/abc");
        assert_eq!(
            transport.upload_url(),
            "https://www.googleapis.com/upload/drive/v3/files"
        );
    }
}
