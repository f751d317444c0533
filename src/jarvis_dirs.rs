//! Centralized application directory paths for Jarvis.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/jarvis/` | `~/.local/share/jarvis/` |
//! | Config | `~/Library/Application Support/jarvis/` | `~/.config/jarvis/` |
//!
//! # Environment Overrides
//!
//! - `JARVIS_DATA_DIR` overrides [`data_dir`]
//! - `JARVIS_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the profile and chat history documents and the log directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("JARVIS_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("jarvis"))
        .unwrap_or_else(|| PathBuf::from("/tmp/jarvis-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("JARVIS_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("jarvis"))
        .unwrap_or_else(|| PathBuf::from("/tmp/jarvis-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
