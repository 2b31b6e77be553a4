//! Session persistence: the opaque blob a client hands back after authenticating.

use std::path::{Path, PathBuf};
use thunderbot_core::error::BotError;
use tracing::info;

/// File-backed store for the client session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. `Ok(None)` when none was saved.
    pub fn load(&self) -> Result<Option<serde_json::Value>, BotError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            BotError::Session(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let session = serde_json::from_str(&content).map_err(|e| {
            BotError::Session(format!("failed to parse {}: {e}", self.path.display()))
        })?;

        info!("loaded previous session from {}", self.path.display());
        Ok(Some(session))
    }

    /// Persist a session, replacing any previous one.
    pub fn save(&self, session: &serde_json::Value) -> Result<(), BotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string(session)?;
        std::fs::write(&self.path, content).map_err(|e| {
            BotError::Session(format!("failed to save {}: {e}", self.path.display()))
        })?;
        Ok(())
    }

    /// Remove the stored session. Succeeds if there was none.
    pub fn delete(&self) -> Result<(), BotError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("deleted session {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BotError::Session(format!(
                "failed to delete {}: {e}",
                self.path.display()
            ))),
        }
    }
}
