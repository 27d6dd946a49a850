#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::fs;
use tokio::sync::RwLock;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// Holds the bearer token for the lifetime of the process and mirrors it to a
/// file so later runs stay logged in. Clones share the same token.
#[derive(Clone, Debug)]
pub struct AuthStore {
    pub file_path: PathBuf,
    token: Arc<RwLock<Option<String>>>,
}

impl Default for AuthStore {
    fn default() -> AuthStore {
        return AuthStore::new(PathBuf::from(Config::get(ConfigKey::TokenFile)));
    }
}

impl AuthStore {
    pub fn new(file_path: PathBuf) -> AuthStore {
        return AuthStore {
            file_path,
            token: Arc::new(RwLock::new(None)),
        };
    }

    /// Reads a previously persisted token, if there is one.
    pub async fn load(&self) -> Result<Option<String>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&self.file_path).await?;
        let token = Some(text.trim().to_string()).filter(|e| return !e.is_empty());
        *self.token.write().await = token.clone();

        return Ok(token);
    }

    pub async fn token(&self) -> Option<String> {
        return self.token.read().await.clone();
    }

    pub async fn is_authenticated(&self) -> bool {
        return self.token.read().await.is_some();
    }

    pub async fn set(&self, token: &str) -> Result<()> {
        *self.token.write().await = Some(token.to_string());

        if let Some(parent) = self.file_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.file_path, token).await?;

        return Ok(());
    }

    /// Forgets the token in memory and on disk.
    pub async fn clear(&self) -> Result<()> {
        *self.token.write().await = None;

        if self.file_path.exists() {
            fs::remove_file(&self.file_path).await?;
        }
        tracing::debug!(path = ?self.file_path, "cleared auth token");

        return Ok(());
    }
}
