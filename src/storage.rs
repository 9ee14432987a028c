//! Durable key/value persistence for board addresses and button state.
//!
//! Each key is one JSON document on disk. Storage failures are never fatal:
//! callers surface them as diagnostic messages and carry on with in-memory
//! state, as if nothing had been persisted.

use crate::error::{Result, SwitchError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Key holding the flat ordered list of known board addresses.
pub const KEY_BOARD_IPS: &str = "boardIps";

/// Key holding the ordered button records.
pub const KEY_BUTTONS: &str = "buttons";

/// File-backed key/value store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a store rooted at the given directory (created lazily on the
    /// first save).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store at the platform config location, e.g.
    /// `~/.config/vanswitch` on Linux.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| SwitchError::config_error("No config directory on this platform"))?;
        Ok(Self::new(base.join("vanswitch")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the value stored under `key`, or `None` when nothing was saved.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.key_path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SwitchError::storage_error(format!(
                    "reading {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SwitchError::storage_error(format!("decoding {}: {}", key, e)))
    }

    /// Save `value` under `key`, replacing any previous value.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            SwitchError::storage_error(format!("creating {}: {}", self.root.display(), e))
        })?;

        let path = self.key_path(key);
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| SwitchError::storage_error(format!("encoding {}: {}", key, e)))?;
        std::fs::write(&path, json).map_err(|e| {
            SwitchError::storage_error(format!("writing {}: {}", path.display(), e))
        })
    }

    /// Wipe every stored key.
    pub fn clear(&self) -> Result<()> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(SwitchError::storage_error(format!(
                    "listing {}: {}",
                    self.root.display(),
                    e
                )))
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path).map_err(|e| {
                    SwitchError::storage_error(format!("removing {}: {}", path.display(), e))
                })?;
            }
        }
        Ok(())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}
