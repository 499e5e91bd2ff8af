//! Key-value session store.
//!
//! Holds the small per-device blobs that do not belong in any user's pill
//! document: the current user id and the global notifications toggle. Same
//! atomic-write and locking discipline as the pill store.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key the CLI uses for the logged-in user id
pub const CURRENT_USER_KEY: &str = "current_user";

/// Key for the app-wide notifications switch ("true"/"false")
pub const NOTIFICATIONS_ENABLED_KEY: &str = "notifications_enabled";

/// Session store contract: flat string key-value pairs
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// JSON-file-backed session store
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store persisting to `<data_dir>/session.json`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("session.json"),
        }
    }

    fn load(path: &Path) -> Result<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        file.unlock()?;
        read_result?;

        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!("Failed to parse session file {:?}: {}. Starting fresh.", path, e);
                Ok(HashMap::new())
            }
        }
    }

    fn save(path: &Path, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "session path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(map)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(Self::load(&self.path)?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut map = Self::load(&self.path)?;
        map.insert(key.to_string(), value.to_string());
        Self::save(&self.path, &map)?;
        tracing::debug!("Session key '{}' set", key);
        Ok(())
    }
}
