use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reconcile::Direction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// State file name inside the state directory
pub const STATE_FILE: &str = "state.toml";

// ============================================================================
// State Structures
// ============================================================================

/// Sync history for every folder confsync has applied to
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Per-folder state, keyed by the folder's absolute path
    #[serde(default)]
    pub folders: BTreeMap<String, FolderState>,

    /// Last time the state was updated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Sync history of one folder
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FolderState {
    /// Remote entity address, e.g. `hosts/7`
    pub address: String,

    /// Last successful pull
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pull: Option<DateTime<Utc>>,

    /// Last successful push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_push: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Get the state file path
    pub fn state_file() -> Result<PathBuf> {
        Ok(paths::state_dir()?.join(STATE_FILE))
    }

    /// Load state from disk, or return default if the file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::state_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::state_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Record a successful apply
    pub fn record(
        &mut self,
        folder: &Path,
        address: &str,
        direction: Direction,
        at: DateTime<Utc>,
    ) {
        let entry = self.folders.entry(folder_key(folder)).or_default();
        entry.address = address.to_string();
        match direction {
            Direction::Pull => entry.last_pull = Some(at),
            Direction::Push => entry.last_push = Some(at),
        }
        self.last_updated = Some(at);
    }

    pub fn folder(&self, folder: &Path) -> Option<&FolderState> {
        self.folders.get(&folder_key(folder))
    }
}

/// Absolute form of a folder path, used as the state key
fn folder_key(folder: &Path) -> String {
    let absolute = if folder.is_absolute() {
        folder.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(folder))
            .unwrap_or_else(|_| folder.to_path_buf())
    };
    absolute.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_file_gives_default() {
        let tmp = TempDir::new().unwrap();
        let state = SyncState::load_from(&tmp.path().join(STATE_FILE)).unwrap();
        assert!(state.folders.is_empty());
        assert!(state.last_updated.is_none());
    }

    #[test]
    fn test_record_keeps_both_directions() {
        let mut state = SyncState::default();
        let folder = Path::new("/srv/confsync/hosts/7");
        state.record(folder, "hosts/7", Direction::Pull, at(9));
        state.record(folder, "hosts/7", Direction::Push, at(10));

        let entry = state.folder(folder).unwrap();
        assert_eq!(entry.address, "hosts/7");
        assert_eq!(entry.last_pull, Some(at(9)));
        assert_eq!(entry.last_push, Some(at(10)));
        assert_eq!(state.last_updated, Some(at(10)));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join(STATE_FILE);

        let mut state = SyncState::default();
        state.record(Path::new("/srv/apps/1"), "applications/1", Direction::Pull, at(8));
        state.save_to(&path).unwrap();

        let loaded = SyncState::load_from(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_relative_folders_are_made_absolute() {
        let mut state = SyncState::default();
        state.record(Path::new("hosts/7"), "hosts/7", Direction::Pull, at(8));
        let key = state.folders.keys().next().unwrap();
        assert!(Path::new(key).is_absolute());
        assert!(state.folder(Path::new("hosts/7")).is_some());
    }
}
