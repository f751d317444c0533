//! Persistence Store: the profile and chat history as two JSON documents.
//!
//! Loads never fail: a missing or unreadable document yields defaults (an
//! empty history, a default profile) and a warning in the log. Saves are
//! atomic (temp file + fsync + rename) so a failed write leaves the previous
//! document intact.
//!
//! Turns are written in the legacy `{"role": ..., "parts": [content]}` shape
//! so history files stay readable by older installs. Turns written as
//! `{"role": ..., "content": ...}` are accepted on load as well.

use crate::error::{AssistantError, Result};
use crate::memory::{Role, Turn};
use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk shape of one turn.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTurn {
    role: String,
    #[serde(default)]
    parts: Vec<String>,
    #[serde(default, skip_serializing)]
    content: Option<String>,
}

impl From<StoredTurn> for Turn {
    fn from(stored: StoredTurn) -> Self {
        let content = stored
            .parts
            .into_iter()
            .next()
            .or(stored.content)
            .unwrap_or_default();
        Turn {
            role: Role::from_wire(&stored.role),
            content,
        }
    }
}

impl From<&Turn> for StoredTurn {
    fn from(turn: &Turn) -> Self {
        StoredTurn {
            role: turn.role.as_str().to_owned(),
            parts: vec![turn.content.clone()],
            content: None,
        }
    }
}

/// File-backed store for the profile and chat history.
#[derive(Debug, Clone)]
pub struct Store {
    profile_path: PathBuf,
    transcript_path: PathBuf,
}

impl Store {
    /// Create a store over two document paths. Nothing is touched on disk.
    #[must_use]
    pub fn new(profile_path: impl Into<PathBuf>, transcript_path: impl Into<PathBuf>) -> Self {
        Self {
            profile_path: profile_path.into(),
            transcript_path: transcript_path.into(),
        }
    }

    /// Store rooted at the configured storage locations.
    #[must_use]
    pub fn from_config(config: &crate::config::StorageConfig) -> Self {
        Self::new(config.profile_path(), config.transcript_path())
    }

    #[must_use]
    pub fn profile_path(&self) -> &Path {
        &self.profile_path
    }

    #[must_use]
    pub fn transcript_path(&self) -> &Path {
        &self.transcript_path
    }

    /// Load the profile, or defaults when absent or unreadable.
    #[must_use]
    pub fn load_profile(&self) -> Profile {
        read_document(&self.profile_path).unwrap_or_default()
    }

    /// Persist the profile.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Persistence`] if the document cannot be written.
    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        write_document_atomic(&self.profile_path, profile)
    }

    /// Load the chat history, or an empty one when absent or unreadable.
    #[must_use]
    pub fn load_transcript(&self) -> Vec<Turn> {
        read_document::<Vec<StoredTurn>>(&self.transcript_path)
            .map(|stored| stored.into_iter().map(Turn::from).collect())
            .unwrap_or_default()
    }

    /// Persist the chat history.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Persistence`] if the document cannot be written.
    pub fn save_transcript(&self, turns: &[Turn]) -> Result<()> {
        let stored: Vec<StoredTurn> = turns.iter().map(StoredTurn::from).collect();
        write_document_atomic(&self.transcript_path, &stored)
    }
}

/// Read and parse a JSON document. `None` when missing or invalid.
fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        debug!("{} not found, using defaults", path.display());
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("failed to read {}: {e}; using defaults", path.display());
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("failed to parse {}: {e}; using defaults", path.display());
            None
        }
    }
}

/// Atomically write a JSON document: temp file, fsync, rename.
fn write_document_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    write_atomic_with(path, value, File::sync_all)
}

fn write_atomic_with<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    sync: impl FnOnce(&File) -> std::io::Result<()>,
) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AssistantError::Persistence(format!("failed to serialize: {e}")))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            AssistantError::Persistence(format!(
                "failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let mut file = File::create(&tmp_path).map_err(|e| {
        AssistantError::Persistence(format!(
            "failed to create temp file {}: {e}",
            tmp_path.display()
        ))
    })?;

    let written = file
        .write_all(json.as_bytes())
        .map_err(|e| format!("failed to write temp file {}: {e}", tmp_path.display()))
        .and_then(|()| {
            sync(&file)
                .map_err(|e| format!("failed to sync temp file {}: {e}", tmp_path.display()))
        });
    drop(file);
    if let Err(message) = written {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(AssistantError::Persistence(message));
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        AssistantError::Persistence(format!(
            "failed to rename temp file to {}: {e}",
            path.display()
        ))
    })?;

    Ok(())
}
