use crate::domain::ports::BlobStorage;
use crate::utils::error::{FxError, Result};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 每個 namespace 存成目錄下的一個 `<namespace>.json` 檔
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    pub fn blob_path(&self, namespace: &str) -> PathBuf {
        Path::new(&self.base_path).join(format!("{}.json", namespace))
    }
}

impl BlobStorage for LocalStorage {
    async fn read_blob(&self, namespace: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.blob_path(namespace);
        match fs::read(&full_path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FxError::StorageError {
                message: format!("cannot read {}: {}", full_path.display(), e),
            }),
        }
    }

    async fn write_blob(&self, namespace: &str, data: &[u8]) -> Result<()> {
        let full_path = self.blob_path(namespace);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}

/// 僅存在於本行程記憶體中的儲存，用於 `--no-cache` 與測試
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self, namespace: &str) -> Option<Vec<u8>> {
        let blobs = self.blobs.lock().await;
        blobs.get(namespace).cloned()
    }
}

impl BlobStorage for MemoryStorage {
    async fn read_blob(&self, namespace: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().await;
        Ok(blobs.get(namespace).cloned())
    }

    async fn write_blob(&self, namespace: &str, data: &[u8]) -> Result<()> {
        let mut blobs = self.blobs.lock().await;
        blobs.insert(namespace.to_string(), data.to_vec());
        Ok(())
    }
}
