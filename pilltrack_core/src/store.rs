//! Pill document store.
//!
//! The scheduler treats persistence as an external collaborator with a
//! simple request/response contract. `PillStore` is that contract, and
//! `JsonStore` is the file-backed implementation: one JSON document per
//! user, written atomically (temp file + rename) with advisory locking.

use crate::{Error, Pill, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Document store contract, keyed by user and pill id
pub trait PillStore {
    fn list(&self, user: &str) -> Result<Vec<Pill>>;
    fn create(&mut self, user: &str, pill: Pill) -> Result<String>;
    fn update(&mut self, user: &str, id: &str, pill: Pill) -> Result<()>;
    fn delete(&mut self, user: &str, id: &str) -> Result<()>;
}

/// JSON-file-backed pill store
///
/// Each user's pills live in `<data_dir>/pills/<user>.json`. A corrupted or
/// unreadable document degrades to an empty list with a warning so one bad
/// file never wedges the app.
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn user_path(&self, user: &str) -> PathBuf {
        self.data_dir.join("pills").join(format!("{}.json", user))
    }

    fn load(path: &Path) -> Result<Vec<Pill>> {
        if !path.exists() {
            tracing::debug!("No pill document at {:?}, empty list", path);
            return Ok(Vec::new());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open pill document {:?}: {}. Using empty list.", path, e);
                return Ok(Vec::new());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock pill document {:?}: {}. Using empty list.", path, e);
            return Ok(Vec::new());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read pill document {:?}: {}. Using empty list.", path, e);
            return Ok(Vec::new());
        }

        file.unlock()?;

        match serde_json::from_str::<Vec<Pill>>(&contents) {
            Ok(pills) => {
                tracing::debug!("Loaded {} pills from {:?}", pills.len(), path);
                Ok(pills)
            }
            Err(e) => {
                tracing::warn!("Failed to parse pill document {:?}: {}. Using empty list.", path, e);
                Ok(Vec::new())
            }
        }
    }

    fn save(path: &Path, pills: &[Pill]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "pill document path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(pills)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} pills to {:?}", pills.len(), path);
        Ok(())
    }
}

impl PillStore for JsonStore {
    fn list(&self, user: &str) -> Result<Vec<Pill>> {
        let mut pills = Self::load(&self.user_path(user))?;
        crate::types::sort_pills(&mut pills);
        Ok(pills)
    }

    fn create(&mut self, user: &str, mut pill: Pill) -> Result<String> {
        pill.validate()?;

        let path = self.user_path(user);
        let mut pills = Self::load(&path)?;

        let id = uuid::Uuid::new_v4().to_string();
        pill.id = Some(id.clone());
        pills.push(pill);

        Self::save(&path, &pills)?;
        tracing::info!("Created pill {} for user {}", id, user);
        Ok(id)
    }

    fn update(&mut self, user: &str, id: &str, mut pill: Pill) -> Result<()> {
        pill.validate()?;

        let path = self.user_path(user);
        let mut pills = Self::load(&path)?;

        let slot = pills
            .iter_mut()
            .find(|p| p.id.as_deref() == Some(id))
            .ok_or_else(|| Error::Store(format!("no pill with id {} for user {}", id, user)))?;

        pill.id = Some(id.to_string());
        *slot = pill;

        Self::save(&path, &pills)?;
        tracing::info!("Updated pill {} for user {}", id, user);
        Ok(())
    }

    fn delete(&mut self, user: &str, id: &str) -> Result<()> {
        let path = self.user_path(user);
        let mut pills = Self::load(&path)?;

        let before = pills.len();
        pills.retain(|p| p.id.as_deref() != Some(id));

        if pills.len() == before {
            return Err(Error::Store(format!(
                "no pill with id {} for user {}",
                id, user
            )));
        }

        Self::save(&path, &pills)?;
        tracing::info!("Deleted pill {} for user {}", id, user);
        Ok(())
    }
}
