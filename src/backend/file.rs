//! Remote stored as a JSON ledger file.
//!
//! Meant for devices that share a synced folder. Every request reads the
//! file, and pushes write it back through a temporary file and a rename so
//! readers never observe a half-written ledger. A missing file is an empty
//! remote; an unreadable one is reported as unavailable.

use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::ledger::RemoteLedger;
use super::{BackendError, ChangeBatch, PushResult, RemoteBackend, RemoteChange};

pub struct FileRemote {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileRemote {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<RemoteLedger, BackendError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(RemoteLedger::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                BackendError::InvalidData(format!("Failed to parse ledger {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RemoteLedger::new()),
            Err(e) => Err(BackendError::Unavailable(format!(
                "Failed to read ledger {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn store(&self, ledger: &RemoteLedger) -> Result<(), BackendError> {
        let json = serde_json::to_vec_pretty(ledger)
            .map_err(|e| BackendError::Other(format!("Failed to serialize ledger: {}", e)))?;
        let unavailable = |e: std::io::Error| {
            BackendError::Unavailable(format!("Failed to write ledger {}: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(unavailable)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(unavailable)?;
        Ok(())
    }
}

#[async_trait]
impl RemoteBackend for FileRemote {
    fn backend_type(&self) -> &str {
        "file"
    }

    async fn push(&self, changes: Vec<RemoteChange>) -> Result<Vec<PushResult>, BackendError> {
        let _guard = self.write_lock.lock().await;
        let mut ledger = self.load().await?;
        let results = ledger.apply_all(changes);
        self.store(&ledger).await?;
        debug!("Wrote {} ledger entries to {}", ledger.len(), self.path.display());
        Ok(results)
    }

    async fn fetch_changes(&self, cursor: Option<&str>, limit: usize) -> Result<ChangeBatch, BackendError> {
        let ledger = self.load().await?;
        ledger.changes_since(cursor, limit)
    }
}
