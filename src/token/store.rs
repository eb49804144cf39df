//! Token store implementations
//!
//! Provides an in-memory store and a file-based store with atomic writes.

use super::types::{is_token_valid, TokenPair};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persists and retrieves the current token pair
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current token pair, if logged in
    async fn tokens(&self) -> Result<Option<TokenPair>>;

    /// Replace the stored token pair
    async fn set_tokens(&self, tokens: TokenPair) -> Result<()>;

    /// Remove all stored tokens
    async fn clear_tokens(&self) -> Result<()>;

    /// Current access token, absent when logged out
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self
            .tokens()
            .await?
            .filter(TokenPair::is_logged_in)
            .map(|pair| pair.access_token))
    }

    /// Check whether a token is still usable
    fn is_token_valid(&self, token: &str) -> bool {
        is_token_valid(token)
    }
}

/// In-memory token store
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    tokens: Arc<RwLock<Option<TokenPair>>>,
}

impl MemoryTokenStore {
    /// Create an empty (logged out) store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a token pair
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Arc::new(RwLock::new(Some(tokens))),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn tokens(&self) -> Result<Option<TokenPair>> {
        Ok(self.tokens.read().await.clone())
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<()> {
        *self.tokens.write().await = Some(tokens);
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<()> {
        *self.tokens.write().await = None;
        Ok(())
    }
}

/// Token store backed by a JSON file
///
/// The file is the source of truth; a cached copy avoids re-reading it on
/// every request. A missing file means logged out.
#[derive(Debug)]
pub struct FileTokenStore {
    /// Path to the token file
    path: PathBuf,
    /// Cached contents
    cached: RwLock<Option<TokenPair>>,
}

impl FileTokenStore {
    /// Open a store at the given path, loading existing tokens if present
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cached = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                Error::token_store(format!("Failed to read token file: {e}"))
            })?;
            parse_tokens(&contents)?
        } else {
            None
        };

        Ok(Self {
            path,
            cached: RwLock::new(cached),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_file(&self, tokens: &TokenPair) -> Result<()> {
        let contents = serde_json::to_string_pretty(tokens)
            .map_err(|e| Error::token_store(format!("Failed to serialize tokens: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::token_store(format!("Failed to create token dir: {e}")))?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::token_store(format!("Failed to write token file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::token_store(format!("Failed to rename token file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn tokens(&self) -> Result<Option<TokenPair>> {
        Ok(self.cached.read().await.clone())
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<()> {
        let mut cached = self.cached.write().await;
        self.write_file(&tokens).await?;
        *cached = Some(tokens);
        Ok(())
    }

    async fn clear_tokens(&self) -> Result<()> {
        let mut cached = self.cached.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::token_store(format!(
                    "Failed to remove token file: {e}"
                )))
            }
        }
        *cached = None;
        Ok(())
    }
}

fn parse_tokens(contents: &str) -> Result<Option<TokenPair>> {
    if contents.trim().is_empty() {
        return Ok(None);
    }
    let tokens: TokenPair = serde_json::from_str(contents)
        .map_err(|e| Error::token_store(format!("Failed to parse token file: {e}")))?;
    Ok(Some(tokens))
}
