// src/services/auth.rs
// One-shot token issuance and verification

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Prefix of every issued token
pub const TOKEN_PREFIX: &str = "tok-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token already initialized")]
    AlreadyInitialized,
}

/// Outcome of checking a presented token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheck {
    Valid,
    Invalid,
    NotInitialized,
}

/// Holds the single bearer token. It can be issued exactly once per process.
#[derive(Debug, Default)]
pub struct TokenManager {
    token: RwLock<Option<String>>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the token. Every call after the first fails.
    pub async fn initialize(&self) -> Result<String, AuthError> {
        let mut guard = self.token.write().await;
        if guard.is_some() {
            return Err(AuthError::AlreadyInitialized);
        }

        let token = format!("{}{}", TOKEN_PREFIX, Uuid::new_v4());
        *guard = Some(token.clone());

        info!("Access token issued");
        Ok(token)
    }

    pub async fn is_initialized(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn verify(&self, presented: Option<&str>) -> TokenCheck {
        let guard = self.token.read().await;
        let Some(expected) = guard.as_deref() else {
            return TokenCheck::NotInitialized;
        };

        match presented {
            Some(candidate) if constant_time_eq(candidate.as_bytes(), expected.as_bytes()) => {
                TokenCheck::Valid
            }
            _ => TokenCheck::Invalid,
        }
    }
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_only_once() {
        let auth = TokenManager::new();

        let token = auth.initialize().await.unwrap();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + 36);

        assert_eq!(auth.initialize().await, Err(AuthError::AlreadyInitialized));
    }

    #[tokio::test]
    async fn test_verify_before_initialize() {
        let auth = TokenManager::new();
        assert!(!auth.is_initialized().await);
        assert_eq!(auth.verify(Some("tok-anything")).await, TokenCheck::NotInitialized);
    }

    #[tokio::test]
    async fn test_verify_tokens() {
        let auth = TokenManager::new();
        let token = auth.initialize().await.unwrap();

        assert_eq!(auth.verify(Some(&token)).await, TokenCheck::Valid);
        assert_eq!(auth.verify(Some("tok-wrong")).await, TokenCheck::Invalid);
        assert_eq!(auth.verify(None).await, TokenCheck::Invalid);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
