//! File commands - one-shot tool calls from the command line

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use colored::Colorize;
use drive_core::classifier;
use drive_types::ToolCall;
use serde_json::{json, Value};
use std::path::Path;

use crate::dispatch::ToolDispatcher;

/// Run one tool call and print its result as JSON
pub async fn execute(dispatcher: &ToolDispatcher, tool: &str, arguments: Value) -> Result<()> {
    let response = dispatcher
        .call(ToolCall {
            id: None,
            tool: tool.to_string(),
            arguments,
        })
        .await;

    if let Some(error) = response.error {
        let hint = if error.retryable {
            " (retryable)".yellow().to_string()
        } else {
            String::new()
        };
        bail!("[{}] {}{}", error.kind, error.message, hint);
    }

    let result = response.result.unwrap_or(Value::Null);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Build `upload_drive_file` arguments from inline content or a local file.
///
/// File content is base64 encoded when the MIME type is uploaded as binary.
pub async fn upload_arguments(
    name: &str,
    mime_type: &str,
    content: Option<String>,
    file: Option<&Path>,
    folder_id: Option<String>,
) -> Result<Value> {
    let content = match (content, file) {
        (Some(content), None) => content,
        (None, Some(path)) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {:?}", path))?;
            if classifier::uploads_as_base64(mime_type) {
                STANDARD.encode(bytes)
            } else {
                String::from_utf8(bytes)
                    .with_context(|| format!("{:?} is not UTF-8 text; pass a binary MIME type", path))?
            }
        }
        (Some(_), Some(_)) => bail!("Pass either --content or --file, not both"),
        (None, None) => bail!("Nothing to upload: pass --content or --file"),
    };

    let mut arguments = json!({
        "file_name": name,
        "content": content,
        "mime_type": mime_type,
    });
    if let Some(folder_id) = folder_id {
        arguments["folder_id"] = Value::String(folder_id);
    }
    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_arguments_from_binary_file() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("pixel.png");
        std::fs::write(&path, [0x89u8, b'P', b'N', b'G'])?;

        let arguments =
            upload_arguments("pixel.png", "image/png", None, Some(&path), Some("folder1".into()))
                .await?;
        assert_eq!(arguments["content"], STANDARD.encode([0x89u8, b'P', b'N', b'G']));
        assert_eq!(arguments["folder_id"], "folder1");
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_arguments_inline_text() -> Result<()> {
        let arguments =
            upload_arguments("a.txt", "text/plain", Some("hello".into()), None, None).await?;
        assert_eq!(arguments["content"], "hello");
        assert!(arguments.get("folder_id").is_none());

        assert!(upload_arguments("a.txt", "text/plain", None, None, None)
            .await
            .is_err());
        Ok(())
    }
}
