use crate::domain::ports::CredentialStore;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_STORE_PATH: &str = ".bid-dashboard/service_key";

/// Keeps the credential in a single file on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                tracing::debug!("Loaded API key from {}", self.path.display());
                Ok(Some(content.trim_end_matches(['\r', '\n']).to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No stored API key at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, value: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(&self.path, value.as_bytes()).await?;
        tracing::debug!("Saved API key to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    value: Arc<Mutex<Option<String>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(value.into()))),
            saves: Arc::default(),
        }
    }

    pub async fn current(&self) -> Option<String> {
        self.value.lock().await.clone()
    }

    /// Number of `save` calls so far.
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.value.lock().await.clone())
    }

    async fn save(&self, value: &str) -> Result<()> {
        *self.value.lock().await = Some(value.to_string());
        *self.saves.lock().await += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join("nested/dir/key"));

        assert_eq!(store.load().await.unwrap(), None);

        store.save("abc%2B123==").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("abc%2B123=="));

        store.save("").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_file_store_ignores_trailing_newline() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key");
        std::fs::write(&path, "edited-by-hand\n").unwrap();

        let store = FileCredentialStore::new(path);
        assert_eq!(store.load().await.unwrap().as_deref(), Some("edited-by-hand"));
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves() {
        let store = MemoryCredentialStore::with_value("first");
        assert_eq!(store.load().await.unwrap().as_deref(), Some("first"));

        store.save("second").await.unwrap();
        store.save("third").await.unwrap();

        assert_eq!(store.current().await.as_deref(), Some("third"));
        assert_eq!(store.save_count().await, 2);
    }
}
