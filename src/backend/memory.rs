//! In-process remote, shared between stores of the same process.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::ledger::RemoteLedger;
use super::{BackendError, ChangeBatch, PushResult, RemoteBackend, RemoteChange};

/// Remote kept in memory.
///
/// Clones share the same ledger, which lets several local stores act as
/// devices syncing through one remote. The remote can be switched offline
/// to exercise the unavailable path.
#[derive(Clone, Debug)]
pub struct MemoryRemote {
    ledger: Arc<Mutex<RemoteLedger>>,
    online: Arc<AtomicBool>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(Mutex::new(RemoteLedger::new())),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Snapshot of the remote state.
    pub async fn ledger(&self) -> RemoteLedger {
        self.ledger.lock().await.clone()
    }

    fn ensure_online(&self) -> Result<(), BackendError> {
        if self.is_online() {
            Ok(())
        } else {
            Err(BackendError::Unavailable("memory remote is offline".to_string()))
        }
    }
}

#[async_trait]
impl RemoteBackend for MemoryRemote {
    fn backend_type(&self) -> &str {
        "memory"
    }

    async fn push(&self, changes: Vec<RemoteChange>) -> Result<Vec<PushResult>, BackendError> {
        self.ensure_online()?;
        let mut ledger = self.ledger.lock().await;
        Ok(ledger.apply_all(changes))
    }

    async fn fetch_changes(&self, cursor: Option<&str>, limit: usize) -> Result<ChangeBatch, BackendError> {
        self.ensure_online()?;
        let ledger = self.ledger.lock().await;
        ledger.changes_since(cursor, limit)
    }
}
