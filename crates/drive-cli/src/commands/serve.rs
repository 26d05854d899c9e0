//! Serve command - answer tool calls over stdio
//!
//! Reads one JSON [`ToolCall`] per line from stdin and writes one JSON
//! [`ToolResponse`] per line to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use drive_types::{ToolCall, ToolError, ToolResponse};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::dispatch::{ToolDispatcher, INVALID_REQUEST};

pub async fn run(dispatcher: ToolDispatcher) -> Result<()> {
    info!("Serving tool calls on stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let served = serve(&dispatcher, stdin, stdout).await?;
    info!(served, "Input closed, shutting down");
    Ok(())
}

/// Answer calls until `input` is exhausted; returns the number answered
pub async fn serve<R, W>(
    dispatcher: &ToolDispatcher,
    mut input: R,
    mut output: W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut served = 0;

    loop {
        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read request")?;
        if read == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match serde_json::from_str::<ToolCall>(line.trim()) {
                Ok(call) => dispatcher.call(call).await,
                Err(e) => invalid_request(format!("Malformed request: {}", e)),
            },
            Err(e) => invalid_request(format!("Request is not UTF-8: {}", e)),
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        output
            .write_all(&encoded)
            .await
            .context("Failed to write response")?;
        output.flush().await?;

        served += 1;
        debug!(served, ok = response.ok, "Response written");
    }

    Ok(served)
}

fn invalid_request(message: String) -> ToolResponse {
    warn!("{}", message);
    ToolResponse::failure(
        None,
        ToolError {
            kind: INVALID_REQUEST.to_string(),
            message,
            retryable: false,
        },
    )
}
