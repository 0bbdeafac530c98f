use super::lists::PickLists;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListState {
    pub version: u32,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lists: PickLists,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: None,
            lists: PickLists::new(),
        }
    }
}

/// Get the default list file path (~/.config/frc-scout/lists.json)
pub fn get_lists_path() -> PathBuf {
    crate::config::get_config_dir().join("lists.json")
}

/// Load pick lists from a JSON file
///
/// If the file doesn't exist, returns empty lists.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_lists(path: &Path) -> Result<ListState> {
    if !path.exists() {
        return Ok(ListState::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open list file at {}", path.display()))?;

    let state: ListState = serde_json::from_reader(file).context("Failed to load pick lists")?;

    if state.version != STATE_VERSION {
        anyhow::bail!("Unsupported list file version: {}", state.version);
    }

    Ok(state)
}

/// Save pick lists atomically, stamping the update time.
pub fn save_lists(path: &Path, state: &mut ListState) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    state.updated_at = Some(Utc::now());

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, state).context("Failed to serialize pick lists")?;

    file.commit().context("Failed to save pick lists")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alliance::ListKind;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_returns_empty() {
        let dir = TempDir::new().unwrap();
        let state = load_lists(&dir.path().join("lists.json")).unwrap();
        assert_eq!(state.version, 1);
        assert_eq!(state.lists, PickLists::new());
        assert!(state.updated_at.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("lists.json");

        let mut state = ListState::new();
        state.lists.add(ListKind::DoNotPick, 254).unwrap();
        state.lists.add(ListKind::Defense, 971).unwrap();
        state.lists.add(ListKind::Defense, 1678).unwrap();
        save_lists(&path, &mut state).unwrap();

        let loaded = load_lists(&path).unwrap();
        assert!(loaded.updated_at.is_some());
        assert!(loaded.lists.contains(ListKind::DoNotPick, 254));
        assert_eq!(loaded.lists.defense_rank(1678), Some(2));
    }

    #[test]
    fn test_unsupported_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lists.json");
        std::fs::write(&path, r#"{"version": 7, "lists": {}}"#).unwrap();

        let err = load_lists(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported list file version"));
    }
}
