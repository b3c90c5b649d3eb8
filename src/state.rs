use std::{
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
#[cfg(test)]
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unreadable state value {0:?}")]
    Corrupt(String),
}

/// Single-slot persistence for the last notification marker.
pub trait StateStore {
    fn load(&self) -> Result<Option<String>, StateError>;
    fn save(&self, value: &str) -> Result<(), StateError>;
}

/// Keeps the value in a plain text file. Saves go through a temporary file in
/// the same directory and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<String>, StateError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let value = contents.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn save(&self, value: &str) -> Result<(), StateError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| self.io_error(err))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|err| self.io_error(err))?;
        tmp.write_all(value.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| self.io_error(err))?;
        tmp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    value: Mutex<Option<String>>,
}

#[cfg(test)]
impl MemoryStateStore {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }

    pub fn value(&self) -> Option<String> {
        self.value.lock().clone()
    }
}

#[cfg(test)]
impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<String>, StateError> {
        Ok(self.value.lock().clone())
    }

    fn save(&self, value: &str) -> Result<(), StateError> {
        *self.value.lock() = Some(value.to_string());
        Ok(())
    }
}

/// Date of the last delivered notification. Failures never abort a run:
/// reads degrade to "nothing sent yet" and writes only log.
pub struct NotificationState<S> {
    store: S,
}

impl<S: StateStore> NotificationState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn read(&self) -> Option<NaiveDate> {
        let result = self.store.load().and_then(|value| {
            value
                .map(|raw| {
                    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                        .map_err(|_| StateError::Corrupt(raw))
                })
                .transpose()
        });

        match result {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(
                    target: "state",
                    error = %err,
                    "could not read notification state; assuming none sent"
                );
                None
            }
        }
    }

    pub fn write(&self, date: NaiveDate) {
        let value = date.format("%Y-%m-%d").to_string();
        match self.store.save(&value) {
            Ok(()) => tracing::debug!(target: "state", date = %value, "notification state updated"),
            Err(err) => tracing::warn!(
                target: "state",
                error = %err,
                date = %value,
                "could not write notification state"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let state = NotificationState::new(FileStateStore::new(dir.path().join("last.txt")));
        assert_eq!(state.read(), None);
    }

    #[test]
    fn written_date_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.txt");
        let state = NotificationState::new(FileStateStore::new(&path));

        state.write(date(2024, 3, 7));
        assert_eq!(state.read(), Some(date(2024, 3, 7)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "2024-03-07");

        state.write(date(2024, 3, 8));
        assert_eq!(state.read(), Some(date(2024, 3, 8)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "2024-03-08");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.txt");
        fs::write(&path, "2024-03-07\n").unwrap();
        let state = NotificationState::new(FileStateStore::new(&path));
        assert_eq!(state.read(), Some(date(2024, 3, 7)));
    }

    #[test]
    fn corrupt_contents_read_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.txt");
        fs::write(&path, "yesterday-ish").unwrap();
        let state = NotificationState::new(FileStateStore::new(&path));
        assert_eq!(state.read(), None);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("last.txt");
        let store = FileStateStore::new(&path);
        store.save("2024-01-01").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn failed_write_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // the target path is a directory, so the rename cannot succeed
        let path = dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        let store = FileStateStore::new(&path);
        assert!(store.save("2024-01-01").is_err());

        let state = NotificationState::new(store);
        state.write(date(2024, 1, 1));
        assert_eq!(state.read(), None);
    }

    #[test]
    fn memory_store_round_trips_through_state() {
        let state = NotificationState::new(MemoryStateStore::default());
        assert_eq!(state.read(), None);
        state.write(date(2025, 12, 31));
        assert_eq!(state.store().value().as_deref(), Some("2025-12-31"));
        assert_eq!(state.read(), Some(date(2025, 12, 31)));
    }
}
