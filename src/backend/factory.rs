//! Backend factory for creating remote instances from configuration.

use anyhow::{anyhow, Result};
use std::sync::Arc;

use super::{file::FileRemote, memory::MemoryRemote, RemoteBackend};
use crate::config::RemoteConfig;

/// Create a remote backend from its configuration.
///
/// # Errors
/// Returns error if:
/// - Backend type is unknown
/// - Required configuration keys are missing
pub fn create_backend(config: &RemoteConfig) -> Result<Arc<dyn RemoteBackend>> {
    match config.backend_type.as_str() {
        "memory" => Ok(Arc::new(MemoryRemote::new())),
        "file" => {
            let path = config
                .get_config("path")
                .filter(|path| !path.is_empty())
                .ok_or_else(|| anyhow!("Missing 'path' in file backend configuration"))?;
            Ok(Arc::new(FileRemote::new(path)))
        }
        other => Err(anyhow!("Unknown backend type: {}", other)),
    }
}
