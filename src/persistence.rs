//! Whole-collection snapshots of the word lists.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Backing store for the word lists. Every save replaces the whole snapshot
/// stored under `key`.
pub trait Persistence {
    fn save_snapshot(&self, key: &str, value: &Value) -> Result<()>;

    /// `Ok(None)` when nothing was ever saved under `key`.
    fn load_snapshot(&self, key: &str) -> Result<Option<Value>>;
}

pub fn save<T: Serialize>(store: &dyn Persistence, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)?;
    store.save_snapshot(key, &value)
}

/// Loads a snapshot, treating a missing or unreadable one as absent.
pub fn load<T: DeserializeOwned>(store: &dyn Persistence, key: &str) -> Option<T> {
    let value = match store.load_snapshot(key) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("could not read snapshot {key}: {e}");
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("snapshot {key} is corrupt, starting from empty: {e}");
            None
        }
    }
}

/// One pretty-printed JSON file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Persistence for JsonDirStore {
    fn save_snapshot(&self, key: &str, value: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let file = File::create(self.path_for(key))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, value)?;
        Ok(())
    }

    fn load_snapshot(&self, key: &str) -> Result<Option<Value>> {
        let file = match File::open(self.path_for(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }
}

/// Keeps snapshots in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: RefCell<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.snapshots.borrow().contains_key(key)
    }
}

impl Persistence for MemoryStore {
    fn save_snapshot(&self, key: &str, value: &Value) -> Result<()> {
        self.snapshots
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn load_snapshot(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.snapshots.borrow().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn dir_store_round_trips_and_overwrites() {
        let dir = tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("history"));

        let mut words = BTreeMap::new();
        words.insert("casa".to_string(), 1);
        save(&store, "known_words", &words).unwrap();
        words.insert("perro".to_string(), 2);
        save(&store, "known_words", &words).unwrap();

        let loaded: BTreeMap<String, i32> = load(&store, "known_words").unwrap();
        assert_eq!(loaded, words);
        assert!(dir.path().join("history/known_words.json").exists());
    }

    #[test]
    fn missing_and_corrupt_snapshots_load_as_absent() {
        let dir = tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        assert!(load::<Vec<String>>(&store, "ignored_words").is_none());

        fs::write(dir.path().join("ignored_words.json"), "{ not json").unwrap();
        assert!(load::<Vec<String>>(&store, "ignored_words").is_none());

        fs::write(dir.path().join("ignored_words.json"), "{\"a\": 1}").unwrap();
        assert!(load::<Vec<String>>(&store, "ignored_words").is_none());
    }

    #[test]
    fn memory_store_keeps_latest_snapshot() {
        let store = MemoryStore::new();
        save(&store, "phrases", &vec!["a b"]).unwrap();
        save(&store, "phrases", &vec!["c d"]).unwrap();
        assert!(store.contains("phrases"));
        assert_eq!(load::<Vec<String>>(&store, "phrases"), Some(vec!["c d".to_string()]));
    }
}
