use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Get the platform-appropriate cache directory for frc-scout
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("frc-scout/http-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/frc-scout/http-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the HTTP cache directory
pub fn clear_cache() -> Result<()> {
    let cache_path = get_cache_path();
    match std::fs::remove_dir_all(&cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Last good JSON body per GET request, kept on disk so read-only commands
/// still work when the backend is unreachable.
///
/// Uses cacache for disk persistence and an in-memory HashMap for repeat hits
/// within one run.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Mutex<HashMap<String, Value>>>,
    cache_path: PathBuf,
    enabled: bool, // false when --no-cache
}

impl ResponseCache {
    pub fn new(cache_path: PathBuf) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            cache_path,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(PathBuf::new())
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }

        if let Ok(data) = self.inner.lock() {
            if let Some(value) = data.get(key) {
                return Some(value.clone());
            }
        }

        let bytes = cacache::read_sync(&self.cache_path, key).ok()?;
        let value: Value = serde_json::from_slice(&bytes).ok()?;
        if let Ok(mut data) = self.inner.lock() {
            data.insert(key.to_string(), value.clone());
        }
        Some(value)
    }

    pub fn put(&self, key: &str, value: &Value) {
        if !self.enabled {
            return;
        }

        if let Ok(mut data) = self.inner.lock() {
            data.insert(key.to_string(), value.clone());
        }

        // Disk write failures only cost us the offline fallback
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                if let Err(e) = cacache::write_sync(&self.cache_path, key, bytes) {
                    debug!("Failed to persist cache entry {}: {}", key, e);
                }
            }
            Err(e) => debug!("Failed to serialize cache entry {}: {}", key, e),
        }
    }

    /// Clear the in-memory layer so the next lookup goes back to disk
    pub fn clear_memory(&self) {
        if let Ok(mut data) = self.inner.lock() {
            data.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_put_then_get_survives_memory_clear() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path().to_path_buf());

        cache.put("GET /get_team_rankings", &json!({"254": 120.0}));
        cache.clear_memory();

        assert_eq!(cache.get("GET /get_team_rankings"), Some(json!({"254": 120.0})));
        assert_eq!(cache.get("GET /get_all_teams"), None);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = ResponseCache::disabled();
        cache.put("k", &json!(1));
        assert!(!cache.is_enabled());
        assert_eq!(cache.get("k"), None);
    }
}
