#[cfg(target_arch = "wasm32")]
use crate::core::io::Storage;
#[cfg(target_arch = "wasm32")]
use anyhow::{anyhow, Result};
#[cfg(target_arch = "wasm32")]
use async_trait::async_trait;

/// Browser `localStorage`. Values are UTF-8 documents.
#[cfg(target_arch = "wasm32")]
pub struct WebStorage {
    local: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl WebStorage {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow!("No window available"))?;
        let local = window
            .local_storage()
            .map_err(|e| anyhow!("localStorage error: {:?}", e))?
            .ok_or_else(|| anyhow!("localStorage unavailable"))?;
        Ok(Self { local })
    }
}

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl Storage for WebStorage {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .local
            .get_item(key)
            .map_err(|e| anyhow!("Get error: {:?}", e))?;
        Ok(value.map(String::into_bytes))
    }

    async fn write(&self, key: &str, content: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(content)?;
        self.local
            .set_item(key, text)
            .map_err(|e| anyhow!("Set error (quota?): {:?}", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.local
            .remove_item(key)
            .map_err(|e| anyhow!("Remove error: {:?}", e))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let value = self
            .local
            .get_item(key)
            .map_err(|e| anyhow!("Get error: {:?}", e))?;
        Ok(value.is_some())
    }
}
