use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use super::{Database, Store, StoreError};

/// [`Store`] holding the whole database behind a lock, optionally mirrored to a JSON
/// snapshot after every committed write.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<Database>,
    snapshot: Option<PathBuf>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(database: Database) -> Self {
        Self {
            state: RwLock::new(database),
            snapshot: None,
        }
    }

    /// Loads `path` when it exists, otherwise starts empty. Later writes land in `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let database = if path.exists() {
            let bytes = fs::read(&path).map_err(|err| {
                StoreError::Unavailable(format!("reading {}: {err}", path.display()))
            })?;
            serde_json::from_slice(&bytes).map_err(|err| {
                StoreError::Unavailable(format!("decoding {}: {err}", path.display()))
            })?
        } else {
            Database::default()
        };

        Ok(Self {
            state: RwLock::new(database),
            snapshot: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    fn persist(&self, database: &Database) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let encoded = serde_json::to_vec_pretty(database)
            .map_err(|err| StoreError::Unavailable(format!("encoding snapshot: {err}")))?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, encoded)
            .and_then(|_| fs::rename(&staging, path))
            .map_err(|err| {
                StoreError::Unavailable(format!("writing {}: {err}", path.display()))
            })?;

        debug!(path = %path.display(), "snapshot written");
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

impl Store for InMemoryStore {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<StoreError>,
    {
        let guard = self.state.read().map_err(|_| E::from(poisoned()))?;
        f(&guard)
    }

    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Database) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.state.write().map_err(|_| E::from(poisoned()))?;
        let mut working = guard.clone();
        let value = f(&mut working)?;
        self.persist(&working).map_err(E::from)?;
        *guard = working;
        Ok(value)
    }
}
