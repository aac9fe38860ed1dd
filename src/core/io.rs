use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(target_arch = "wasm32")]
pub use crate::core::web_io::WebStorage;

#[cfg(target_arch = "wasm32")]
pub trait StorageBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> StorageBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait StorageBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> StorageBounds for T {}

/// Flat key-value medium. A key holds one whole document.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Storage: StorageBounds {
    /// `Ok(None)` when the key was never written.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn write(&self, key: &str, content: &[u8]) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
}

// --- Native Implementation ---

/// Stores each key as `<root>/<key>.json`.
#[cfg(not(target_arch = "wasm32"))]
pub struct NativeStorage {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl NativeStorage {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl Storage for NativeStorage {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(tokio::fs::read(&path).await?))
    }

    async fn write(&self, key: &str, content: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), content).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if tokio::fs::try_exists(&path).await? {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }
}

// --- In-memory Implementation ---

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map still holds consistent whole values.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Storage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    async fn write(&self, key: &str, content: &[u8]) -> Result<()> {
        self.entries().insert(key.to_string(), content.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entries().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_native_storage_roundtrip_and_delete() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = NativeStorage::new(dir.path().join("nested"));

        assert_eq!(storage.read("bucket").await?, None);
        assert!(!storage.exists("bucket").await?);

        storage.write("bucket", b"[1,2]").await?;
        assert!(dir.path().join("nested").join("bucket.json").exists());
        assert_eq!(storage.read("bucket").await?.as_deref(), Some(&b"[1,2]"[..]));

        storage.delete("bucket").await?;
        assert!(!storage.exists("bucket").await?);
        // Deleting twice is fine.
        storage.delete("bucket").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_storage_overwrites() -> Result<()> {
        let storage = MemoryStorage::new();
        storage.write("k", b"a").await?;
        storage.write("k", b"b").await?;
        assert_eq!(storage.read("k").await?, Some(b"b".to_vec()));
        Ok(())
    }
}
