//! Tool-call protocol between a caller and the gateway
//!
//! A caller sends one `ToolCall` per line; the dispatcher answers with a
//! `ToolResponse`. Arguments use only strings and integers.

use serde::{Deserialize, Serialize};

/// Description of one callable tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the `arguments` object
    pub input_schema: serde_json::Value,
}

/// Incoming tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlates the response with the call; echoed back unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub tool: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Typed failure returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    /// Stable snake_case error kind, e.g. `not_found`
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

/// Outgoing tool result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolResponse {
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<serde_json::Value>, error: ToolError) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(error),
        }
    }
}

/// Arguments of `list_drive_files`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesArgs {
    /// Absent or null uses the operation's default
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub cursor: Option<String>,
    /// Case-insensitive name filter
    #[serde(default)]
    pub query: Option<String>,
}

/// Arguments of `search_drive_files`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilesArgs {
    pub query: String,
    /// Absent or null uses the operation's default
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Arguments of `read_drive_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileArgs {
    pub file_id: String,
}

/// Arguments of `upload_drive_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileArgs {
    pub file_name: String,
    pub content: String,
    pub mime_type: String,
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// Arguments of `create_drive_directory`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectoryArgs {
    pub folder_name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Arguments of the recent files view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentFilesArgs {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args: ListFilesArgs = serde_json::from_str("{}").unwrap();
        assert_eq!(args.page_size, None);
        assert!(args.cursor.is_none());

        let args: SearchFilesArgs =
            serde_json::from_str(r#"{"query":"budget","page_size":25}"#).unwrap();
        assert_eq!(args.page_size, Some(25));

        let args: RecentFilesArgs = serde_json::from_str("{}").unwrap();
        assert_eq!(args.limit, None);
    }

    #[test]
    fn test_null_sizes_are_absent() {
        let args: ListFilesArgs =
            serde_json::from_str(r#"{"page_size":null,"cursor":null}"#).unwrap();
        assert_eq!(args.page_size, None);

        let args: SearchFilesArgs =
            serde_json::from_str(r#"{"query":"budget","page_size":null}"#).unwrap();
        assert_eq!(args.page_size, None);

        let args: RecentFilesArgs = serde_json::from_str(r#"{"limit":null}"#).unwrap();
        assert_eq!(args.limit, None);
    }

    #[test]
    fn test_call_without_arguments() {
        let call: ToolCall = serde_json::from_str(r#"{"tool":"recent_files"}"#).unwrap();
        assert_eq!(call.tool, "recent_files");
        assert!(call.arguments.is_null());
        assert!(call.id.is_none());
    }
}
