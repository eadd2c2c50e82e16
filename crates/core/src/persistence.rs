//! Persistence providers.
//!
//! Stores and settings documents never touch storage directly. They load their initial snapshot
//! from a [`PersistenceProvider`] and hand every new snapshot back to it before making the change
//! visible. Two providers ship with the crate:
//!
//! - [`MemoryProvider`]: keeps the last saved snapshot in memory (a session that resets on
//!   restart, as the console always did)
//! - [`YamlFileProvider`]: one YAML file per collection, replaced atomically on every save
//!
//! ## File layout
//!
//! ```text
//! <data_dir>/
//!   diagnostic-codes.yaml
//!   roles.yaml
//!   hospital-profile.yaml
//!   ...
//! ```

use crate::constants::{COLLECTION_FILE_EXTENSION, TEMP_FILE_SUFFIX};
use crate::error::{PersistenceError, PersistenceResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Storage collaborator for one collection or document.
pub trait PersistenceProvider<T>: Send + Sync {
    /// Loads the stored snapshot, in order. A collection that was never saved loads as empty.
    fn load(&self) -> PersistenceResult<Vec<T>>;

    /// Replaces the stored snapshot with `items`.
    fn save(&self, items: &[T]) -> PersistenceResult<()>;
}

/// Keeps the last saved snapshot in memory.
#[derive(Debug)]
pub struct MemoryProvider<T> {
    items: Mutex<Vec<T>>,
}

impl<T> MemoryProvider<T> {
    pub fn new() -> Self {
        Self::seeded(Vec::new())
    }

    /// Creates a provider whose first `load` returns `items`.
    pub fn seeded(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

impl<T> Default for MemoryProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> PersistenceProvider<T> for MemoryProvider<T> {
    fn load(&self) -> PersistenceResult<Vec<T>> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, items: &[T]) -> PersistenceResult<()> {
        *self.items.lock().unwrap_or_else(PoisonError::into_inner) = items.to_vec();
        Ok(())
    }
}

/// Stores a snapshot as a YAML sequence in a single file.
///
/// Saves write `<file>.tmp` first and then rename it over the target, so a crash mid-write
/// leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct YamlFileProvider<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> YamlFileProvider<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Provider for `<data_dir>/<name>.yaml`.
    pub fn in_dir(data_dir: &Path, name: &str) -> Self {
        Self::new(data_dir.join(format!("{name}.{COLLECTION_FILE_EXTENSION}")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(TEMP_FILE_SUFFIX);
        self.path.with_file_name(name)
    }
}

impl<T: Serialize + DeserializeOwned> PersistenceProvider<T> for YamlFileProvider<T> {
    fn load(&self) -> PersistenceResult<Vec<T>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::FileRead(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_yaml::from_str(&contents).map_err(PersistenceError::YamlDeserialization)
    }

    fn save(&self, items: &[T]) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(PersistenceError::DirCreation)?;
            }
        }

        let yaml = serde_yaml::to_string(items).map_err(PersistenceError::YamlSerialization)?;
        let temp = self.temp_path();
        fs::write(&temp, yaml).map_err(PersistenceError::FileWrite)?;
        fs::rename(&temp, &self.path).map_err(PersistenceError::FileWrite)?;

        tracing::debug!("saved {} item(s) to {}", items.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
        price: f64,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                name: "Consultation".into(),
                price: 75.0,
            },
            Item {
                name: "X-ray".into(),
                price: 120.5,
            },
        ]
    }

    #[test]
    fn memory_provider_returns_last_save() {
        let provider = MemoryProvider::seeded(vec![1, 2, 3]);
        assert_eq!(provider.load().unwrap(), vec![1, 2, 3]);

        provider.save(&[4]).unwrap();
        assert_eq!(provider.load().unwrap(), vec![4]);
    }

    #[test]
    fn yaml_provider_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let provider = YamlFileProvider::<Item>::in_dir(dir.path(), "service-prices");

        assert!(provider.load().unwrap().is_empty());
        assert_eq!(provider.path(), dir.path().join("service-prices.yaml"));
    }

    #[test]
    fn yaml_provider_round_trips_in_order() {
        let dir = TempDir::new().unwrap();
        let provider = YamlFileProvider::<Item>::in_dir(dir.path(), "service-prices");

        provider.save(&items()).unwrap();
        assert_eq!(provider.load().unwrap(), items());
        assert!(!provider.temp_path().exists());
    }

    #[test]
    fn yaml_provider_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let provider = YamlFileProvider::<Item>::in_dir(&nested, "items");

        provider.save(&items()).unwrap();
        assert!(nested.join("items.yaml").is_file());
    }

    #[test]
    fn yaml_provider_reports_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let provider = YamlFileProvider::<Item>::in_dir(dir.path(), "items");
        fs::write(provider.path(), "- name: [unterminated").unwrap();

        assert!(matches!(
            provider.load(),
            Err(PersistenceError::YamlDeserialization(_))
        ));
    }

    #[test]
    fn yaml_provider_blank_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let provider = YamlFileProvider::<Item>::in_dir(dir.path(), "items");
        fs::write(provider.path(), "\n").unwrap();

        assert!(provider.load().unwrap().is_empty());
    }
}
