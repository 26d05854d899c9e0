//! Scoped pagination cursors
//!
//! A cursor handed to callers wraps the store's raw page token together
//! with the operation and query it belongs to. Replaying it against a
//! different operation or query fails with `InvalidCursor` instead of
//! silently returning a page from another result set.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use drive_types::PageToken;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// The operation and parameters a cursor was issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CursorScope {
    List {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
    },
    Search {
        query: String,
    },
}

impl CursorScope {
    fn describe(&self) -> &'static str {
        match self {
            CursorScope::List { .. } => "list",
            CursorScope::Search { .. } => "search",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    scope: CursorScope,
    token: String,
}

/// Wrap a raw store token for the given scope
pub fn issue(scope: &CursorScope, remote_token: &str) -> Result<PageToken> {
    let envelope = Envelope {
        scope: scope.clone(),
        token: remote_token.to_string(),
    };
    let json = serde_json::to_vec(&envelope)
        .map_err(|e| GatewayError::InvalidCursor(format!("cannot encode cursor: {}", e)))?;
    Ok(PageToken::new(URL_SAFE_NO_PAD.encode(json)))
}

/// Recover the raw store token, checking that `cursor` belongs to `expected`
pub fn redeem(cursor: &PageToken, expected: &CursorScope) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor.as_str().trim())
        .map_err(|_| GatewayError::InvalidCursor("cursor is not recognized".to_string()))?;
    let envelope: Envelope = serde_json::from_slice(&bytes)
        .map_err(|_| GatewayError::InvalidCursor("cursor is not recognized".to_string()))?;

    if envelope.scope != *expected {
        let reason = if envelope.scope.describe() != expected.describe() {
            format!(
                "cursor was issued by {} and cannot be used with {}",
                envelope.scope.describe(),
                expected.describe()
            )
        } else {
            format!(
                "cursor was issued for a different {} query",
                expected.describe()
            )
        };
        return Err(GatewayError::InvalidCursor(reason));
    }

    if envelope.token.is_empty() {
        return Err(GatewayError::InvalidCursor("cursor is empty".to_string()));
    }

    Ok(envelope.token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn list(filter: Option<&str>) -> CursorScope {
        CursorScope::List {
            filter: filter.map(str::to_string),
        }
    }

    #[test]
    fn test_issue_and_redeem_same_scope() {
        let scope = list(Some("report"));
        let cursor = issue(&scope, "remote-token-1").unwrap();
        assert_ne!(cursor.as_str(), "remote-token-1");
        assert_eq!(redeem(&cursor, &scope).unwrap(), "remote-token-1");
    }

    #[test]
    fn test_list_cursor_rejected_by_search() {
        let cursor = issue(&list(None), "t").unwrap();
        let err = redeem(
            &cursor,
            &CursorScope::Search {
                query: "budget".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCursor);
        assert!(err.to_string().contains("list"));
    }

    #[test]
    fn test_filter_mismatch_rejected() {
        let cursor = issue(&list(Some("report")), "t").unwrap();
        assert!(redeem(&cursor, &list(None)).is_err());
        assert!(redeem(&cursor, &list(Some("notes"))).is_err());
    }

    #[test]
    fn test_garbage_cursor_rejected() {
        for raw in ["", "not base64 !!", "eyJmb28iOjF9"] {
            let err = redeem(&PageToken::new(raw), &list(None)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidCursor, "{}", raw);
        }
    }
}
