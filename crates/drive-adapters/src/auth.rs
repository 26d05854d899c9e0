//! Access token sources
//!
//! Acquiring and refreshing OAuth credentials happens outside the gateway.
//! A transport asks its `TokenSource` for a bearer token before each
//! request, so a refreshing implementation can be swapped in.

use async_trait::async_trait;
use drive_core::ports::TransportError;

/// Supplies a bearer token for each request
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, TransportError>;
}

/// A token fixed at construction
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, TransportError> {
        if self.token.trim().is_empty() {
            return Err(TransportError::Unauthenticated(
                "no access token configured".to_string(),
            ));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_token() {
        let token = tokio_test::block_on(StaticToken::new("ya29.token").access_token());
        assert_eq!(token.unwrap(), "ya29.token");

        let missing = tokio_test::block_on(StaticToken::new("  ").access_token());
        assert!(matches!(missing, Err(TransportError::Unauthenticated(_))));
    }
}
