//! Tool call dispatch
//!
//! Routes a [`ToolCall`] to the gateway and shapes the outcome into a
//! [`ToolResponse`]. Used by both the stdio server and the one-shot
//! subcommands.

use drive_core::{ErrorKind, Gateway, GatewayError};
use drive_types::{
    CreateDirectoryArgs, FileEntry, FilePage, ListFilesArgs, PageToken, ReadFileArgs,
    RecentFilesArgs, SearchFilesArgs, ToolCall, ToolDefinition, ToolError, ToolResponse,
    UploadFileArgs, UploadRequest, RECENT_FILES_URI,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

pub const LIST_FILES: &str = "list_drive_files";
pub const SEARCH_FILES: &str = "search_drive_files";
pub const READ_FILE: &str = "read_drive_file";
pub const UPLOAD_FILE: &str = "upload_drive_file";
pub const CREATE_DIRECTORY: &str = "create_drive_directory";
pub const RECENT_FILES: &str = "recent_drive_files";

/// Error kind for calls naming no known tool
pub const UNKNOWN_TOOL: &str = "unknown_tool";

/// Error kind for lines that are not a valid tool call
pub const INVALID_REQUEST: &str = "invalid_request";

pub struct ToolDispatcher {
    gateway: Gateway,
}

impl ToolDispatcher {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Tools this dispatcher accepts, with their argument schemas
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: LIST_FILES.to_string(),
                description: "List files, optionally filtered by a case-insensitive name substring. Pass nextCursor back as cursor to get the next page.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "page_size": { "type": "integer", "minimum": 1, "maximum": 1000, "default": 10 },
                        "cursor": { "type": "string" },
                        "query": { "type": "string", "description": "Name filter" }
                    }
                }),
            },
            ToolDefinition {
                name: SEARCH_FILES.to_string(),
                description: "Search file names and full text content.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string" },
                        "page_size": { "type": "integer", "minimum": 1, "maximum": 100, "default": 10 },
                        "cursor": { "type": "string" }
                    },
                    "required": ["query"]
                }),
            },
            ToolDefinition {
                name: READ_FILE.to_string(),
                description: "Read a file. Native documents are exported to Markdown, CSV or plain text; binary files are returned as base64.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "file_id": { "type": "string" }
                    },
                    "required": ["file_id"]
                }),
            },
            ToolDefinition {
                name: UPLOAD_FILE.to_string(),
                description: "Create a new file. Binary content must be base64 encoded.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "file_name": { "type": "string" },
                        "content": { "type": "string" },
                        "mime_type": { "type": "string" },
                        "folder_id": { "type": "string" }
                    },
                    "required": ["file_name", "content", "mime_type"]
                }),
            },
            ToolDefinition {
                name: CREATE_DIRECTORY.to_string(),
                description: "Create a folder at the root or inside parent_id.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "folder_name": { "type": "string" },
                        "parent_id": { "type": "string" }
                    },
                    "required": ["folder_name"]
                }),
            },
            ToolDefinition {
                name: RECENT_FILES.to_string(),
                description: format!(
                    "Most recently modified files. Also served as the {} resource.",
                    RECENT_FILES_URI
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "minimum": 1, "maximum": 1000, "default": 20 }
                    }
                }),
            },
        ]
    }

    /// Run one tool call. Failures are reported in the response, never raised.
    pub async fn call(&self, call: ToolCall) -> ToolResponse {
        let ToolCall {
            id,
            tool,
            arguments,
        } = call;
        debug!(tool = %tool, "Dispatching tool call");

        match self.route(&tool, arguments).await {
            Ok(result) => ToolResponse::success(id, result),
            Err(error) => {
                warn!(tool = %tool, kind = %error.kind, "Tool call failed: {}", error.message);
                ToolResponse::failure(id, error)
            }
        }
    }

    async fn route(&self, tool: &str, arguments: Value) -> Result<Value, ToolError> {
        match tool {
            LIST_FILES => self.list_files(parse(arguments)?).await,
            SEARCH_FILES => self.search_files(parse(arguments)?).await,
            READ_FILE => self.read_file(parse(arguments)?).await,
            UPLOAD_FILE => self.upload_file(parse(arguments)?).await,
            CREATE_DIRECTORY => self.create_directory(parse(arguments)?).await,
            RECENT_FILES | RECENT_FILES_URI => self.recent_files(parse(arguments)?).await,
            other => Err(ToolError {
                kind: UNKNOWN_TOOL.to_string(),
                message: format!("Unknown tool: {}", other),
                retryable: false,
            }),
        }
    }

    async fn list_files(&self, args: ListFilesArgs) -> Result<Value, ToolError> {
        let cursor = args.cursor.map(PageToken::new);
        let page = self
            .gateway
            .list(args.page_size, cursor.as_ref(), args.query.as_deref())
            .await
            .map_err(gateway_error)?;

        let mut result = page_json(&page);
        if let Some(filter) = args.query {
            result["filter"] = Value::String(filter);
        }
        Ok(result)
    }

    async fn search_files(&self, args: SearchFilesArgs) -> Result<Value, ToolError> {
        let cursor = args.cursor.map(PageToken::new);
        let page = self
            .gateway
            .search(&args.query, args.page_size, cursor.as_ref())
            .await
            .map_err(gateway_error)?;

        let mut result = page_json(&page);
        result["query"] = Value::String(args.query);
        Ok(result)
    }

    async fn read_file(&self, args: ReadFileArgs) -> Result<Value, ToolError> {
        let content = self
            .gateway
            .read_file(&args.file_id)
            .await
            .map_err(gateway_error)?;

        Ok(json!({
            "fileId": content.file.id,
            "fileName": content.file.name,
            "mimeType": content.file.mime_type,
            "size": content.file.size,
            "uri": content.file.uri(),
            "content": content.payload,
        }))
    }

    async fn upload_file(&self, args: UploadFileArgs) -> Result<Value, ToolError> {
        let mut request = UploadRequest::new(args.file_name, args.content, args.mime_type);
        if let Some(folder_id) = args.folder_id {
            request = request.in_folder(folder_id);
        }
        let entry = self.gateway.upload(&request).await.map_err(gateway_error)?;

        Ok(json!({
            "status": "success",
            "uploaded": entry_json(&entry),
        }))
    }

    async fn create_directory(&self, args: CreateDirectoryArgs) -> Result<Value, ToolError> {
        let entry = self
            .gateway
            .create_folder(&args.folder_name, args.parent_id.as_deref())
            .await
            .map_err(gateway_error)?;

        Ok(json!({
            "status": "success",
            "created": entry_json(&entry),
        }))
    }

    async fn recent_files(&self, args: RecentFilesArgs) -> Result<Value, ToolError> {
        let entries = self
            .gateway
            .recent(args.limit)
            .await
            .map_err(gateway_error)?;

        let files: Vec<Value> = entries.iter().map(entry_json).collect();
        Ok(json!({ "recent_files": files }))
    }
}

/// Decode tool arguments; a missing argument object counts as empty
fn parse<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError {
        kind: ErrorKind::InvalidArgument.as_str().to_string(),
        message: format!("Invalid arguments: {}", e),
        retryable: false,
    })
}

fn gateway_error(error: GatewayError) -> ToolError {
    ToolError {
        kind: error.kind().as_str().to_string(),
        message: error.to_string(),
        retryable: error.is_retryable(),
    }
}

fn entry_json(entry: &FileEntry) -> Value {
    json!({
        "id": entry.id,
        "name": entry.name,
        "mimeType": entry.mime_type,
        "modifiedTime": entry.modified_time,
        "createdTime": entry.created_time,
        "parentId": entry.parent_id,
        "size": entry.size,
        "uri": entry.uri(),
    })
}

fn page_json(page: &FilePage) -> Value {
    let files: Vec<Value> = page.entries.iter().map(entry_json).collect();
    json!({
        "files": files,
        "nextCursor": page.next_cursor,
        "totalFound": page.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use drive_core::{MemoryDrive, MemoryFile, TransportError};
    use std::sync::Arc;

    fn dispatcher(drive: Arc<MemoryDrive>) -> ToolDispatcher {
        ToolDispatcher::new(Gateway::new(drive))
    }

    fn call(tool: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: Some(json!(7)),
            tool: tool.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_definitions_cover_every_tool() {
        let names: Vec<String> = ToolDispatcher::definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec![
                LIST_FILES,
                SEARCH_FILES,
                READ_FILE,
                UPLOAD_FILE,
                CREATE_DIRECTORY,
                RECENT_FILES
            ]
        );
    }

    #[tokio::test]
    async fn test_list_pages_through_cursor() {
        let drive = Arc::new(MemoryDrive::new());
        for i in 0..3 {
            drive.insert(MemoryFile::new(format!("note-{}.txt", i), "text/plain", "x"));
        }
        let dispatcher = dispatcher(drive);

        let first = dispatcher
            .call(call(LIST_FILES, json!({ "page_size": 2 })))
            .await;
        assert!(first.ok);
        assert_eq!(first.id, Some(json!(7)));
        let result = first.result.unwrap();
        assert_eq!(result["totalFound"], 2);
        assert!(result["files"][0]["uri"]
            .as_str()
            .unwrap()
            .starts_with("gdrive:///"));
        let cursor = result["nextCursor"].as_str().unwrap().to_string();

        let second = dispatcher
            .call(call(LIST_FILES, json!({ "page_size": 2, "cursor": cursor })))
            .await;
        let result = second.result.unwrap();
        assert_eq!(result["totalFound"], 1);
        assert!(result["nextCursor"].is_null());
    }

    #[tokio::test]
    async fn test_null_page_size_uses_default() {
        let drive = Arc::new(MemoryDrive::new());
        for i in 0..12 {
            drive.insert(MemoryFile::new(format!("log-{}.txt", i), "text/plain", "x"));
        }
        let dispatcher = dispatcher(drive);

        let response = dispatcher
            .call(call(LIST_FILES, json!({ "page_size": null, "cursor": null })))
            .await;
        assert!(response.ok);
        assert_eq!(response.result.unwrap()["totalFound"], 10);

        let response = dispatcher
            .call(call(SEARCH_FILES, json!({ "query": "log", "page_size": null })))
            .await;
        assert!(response.ok);

        let response = dispatcher
            .call(call(RECENT_FILES, json!({ "limit": null })))
            .await;
        assert_eq!(
            response.result.unwrap()["recent_files"]
                .as_array()
                .map(Vec::len),
            Some(12)
        );
    }

    #[tokio::test]
    async fn test_cursor_from_other_scope_is_rejected() {
        let drive = Arc::new(MemoryDrive::new());
        for i in 0..3 {
            drive.insert(MemoryFile::new(format!("budget-{}.txt", i), "text/plain", "x"));
        }
        let dispatcher = dispatcher(drive);

        let first = dispatcher
            .call(call(LIST_FILES, json!({ "page_size": 1 })))
            .await;
        let cursor = first.result.unwrap()["nextCursor"]
            .as_str()
            .unwrap()
            .to_string();

        let response = dispatcher
            .call(call(SEARCH_FILES, json!({ "query": "budget", "cursor": cursor })))
            .await;
        assert!(!response.ok);
        assert_eq!(response.error.unwrap().kind, "invalid_cursor");
    }

    #[tokio::test]
    async fn test_read_plain_text() {
        let drive = Arc::new(MemoryDrive::new());
        let id = drive.insert(MemoryFile::new("todo.txt", "text/plain", "buy milk"));
        let dispatcher = dispatcher(drive);

        let response = dispatcher
            .call(call(READ_FILE, json!({ "file_id": id })))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["fileName"], "todo.txt");
        assert_eq!(result["content"]["type"], "plain_text");
        assert_eq!(result["content"]["text"], "buy milk");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dispatcher = dispatcher(Arc::new(MemoryDrive::new()));

        let response = dispatcher
            .call(call(READ_FILE, json!({ "file_id": "missing" })))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.kind, "not_found");
        assert!(!error.retryable);
    }

    #[tokio::test]
    async fn test_upload_then_recent() {
        let drive = Arc::new(MemoryDrive::new());
        let dispatcher = dispatcher(drive.clone());

        let response = dispatcher
            .call(call(
                UPLOAD_FILE,
                json!({ "file_name": "hello.txt", "content": "hi", "mime_type": "text/plain" }),
            ))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["status"], "success");
        assert_eq!(result["uploaded"]["name"], "hello.txt");
        assert_eq!(drive.file_count(), 1);

        let response = dispatcher.call(call(RECENT_FILES_URI, Value::Null)).await;
        let result = response.result.unwrap();
        assert_eq!(result["recent_files"][0]["name"], "hello.txt");
    }

    #[tokio::test]
    async fn test_create_directory_under_parent() {
        let drive = Arc::new(MemoryDrive::new());
        let dispatcher = dispatcher(drive.clone());

        let parent = dispatcher
            .call(call(CREATE_DIRECTORY, json!({ "folder_name": "Reports" })))
            .await;
        let parent_id = parent.result.unwrap()["created"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let child = dispatcher
            .call(call(
                CREATE_DIRECTORY,
                json!({ "folder_name": "2024", "parent_id": parent_id }),
            ))
            .await;
        let result = child.result.unwrap();
        assert_eq!(result["created"]["parentId"], json!(parent_id));
        assert_eq!(
            result["created"]["mimeType"],
            "application/vnd.google-apps.folder"
        );
        assert_eq!(drive.file_count(), 2);
    }

    #[tokio::test]
    async fn test_bad_arguments_and_unknown_tool() {
        let dispatcher = dispatcher(Arc::new(MemoryDrive::new()));

        let response = dispatcher
            .call(call(SEARCH_FILES, json!({ "page_size": 3 })))
            .await;
        assert_eq!(response.error.unwrap().kind, "invalid_argument");

        let response = dispatcher.call(call("delete_drive_file", json!({}))).await;
        assert_eq!(response.error.unwrap().kind, UNKNOWN_TOOL);
    }

    #[tokio::test]
    async fn test_remote_failure_is_retryable() {
        let drive = Arc::new(MemoryDrive::new());
        drive.fail_next(TransportError::RateLimited("slow down".to_string()));
        let dispatcher = dispatcher(drive);

        let response = dispatcher.call(call(LIST_FILES, json!({}))).await;
        let error = response.error.unwrap();
        assert_eq!(error.kind, "remote_unavailable");
        assert!(error.retryable);
    }
}
