use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::{ConfigEntry, EntryData};
use crate::{Error, Result};

/// Where configured devices live. The flow only ever adds entries or replaces
/// the data of an existing one.
pub trait EntryStore {
    fn entries(&self) -> &[ConfigEntry];

    fn get(&self, entry_id: &str) -> Option<&ConfigEntry> {
        self.entries().iter().find(|e| e.entry_id == entry_id)
    }

    fn insert(&mut self, entry: ConfigEntry) -> Result<()>;

    /// Replace the data of `entry_id` in place and return the updated entry.
    fn update_data(&mut self, entry_id: &str, data: EntryData) -> Result<ConfigEntry>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<ConfigEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryStore for MemoryStore {
    fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    fn insert(&mut self, entry: ConfigEntry) -> Result<()> {
        self.entries.push(entry);
        Ok(())
    }

    fn update_data(&mut self, entry_id: &str, data: EntryData) -> Result<ConfigEntry> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.entry_id == entry_id)
            .ok_or_else(|| Error::EntryNotFound(entry_id.to_string()))?;
        entry.replace_data(data);
        Ok(entry.clone())
    }
}

/// Keeps entries as a JSON array on disk, rewriting the file on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Load `path` if it exists, start empty otherwise.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries: Vec<ConfigEntry> = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::Io(e)),
        };
        debug!(path = %path.display(), count = entries.len(), "loaded config entries");
        Ok(Self {
            path,
            inner: MemoryStore { entries },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self.inner.entries())?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl EntryStore for FileStore {
    fn entries(&self) -> &[ConfigEntry] {
        self.inner.entries()
    }

    fn insert(&mut self, entry: ConfigEntry) -> Result<()> {
        self.inner.insert(entry)?;
        if let Err(e) = self.save() {
            self.inner.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    fn update_data(&mut self, entry_id: &str, data: EntryData) -> Result<ConfigEntry> {
        let previous = self
            .get(entry_id)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(entry_id.to_string()))?;
        let updated = self.inner.update_data(entry_id, data)?;
        if let Err(e) = self.save() {
            if let Some(entry) = self.inner.entries.iter_mut().find(|c| c.entry_id == entry_id) {
                *entry = previous;
            }
            return Err(e);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(ip: &str, interval: u32) -> EntryData {
        EntryData {
            ip_address: ip.to_string(),
            scan_interval: interval,
        }
    }

    #[test]
    fn memory_store_updates_in_place() {
        let mut store = MemoryStore::new();
        let entry = ConfigEntry::new("Ecotracker (a)", data("a", 60));
        let id = entry.entry_id.clone();
        store.insert(entry).unwrap();

        let updated = store.update_data(&id, data("b", 10)).unwrap();

        assert_eq!(store.entries().len(), 1);
        assert_eq!(updated.data, data("b", 10));
        assert_eq!(store.get(&id).unwrap().data, data("b", 10));
        assert_eq!(store.get(&id).unwrap().title, "Ecotracker (a)");
    }

    #[test]
    fn update_of_unknown_entry_fails() {
        let mut store = MemoryStore::new();
        let err = store.update_data("missing", data("a", 60)).unwrap_err();
        assert!(matches!(err, Error::EntryNotFound(ref id) if id == "missing"));
    }

    #[test]
    fn file_store_starts_empty_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("entries.json")).unwrap();
        assert!(store.entries().is_empty());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");

        let id = {
            let mut store = FileStore::open(&path).unwrap();
            let entry = ConfigEntry::new("Ecotracker (a)", data("a", 60));
            let id = entry.entry_id.clone();
            store.insert(entry).unwrap();
            store.update_data(&id, data("a", 120)).unwrap();
            id
        };

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.get(&id).unwrap().data.scan_interval, 120);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn failed_save_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        let mut store = FileStore::open(&path).unwrap();
        let entry = ConfigEntry::new("Ecotracker (a)", data("a", 60));
        let id = entry.entry_id.clone();
        store.insert(entry).unwrap();

        // A directory where the temp file should go makes every save fail.
        fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(store.insert(ConfigEntry::new("Ecotracker (b)", data("b", 60))).is_err());
        assert_eq!(store.entries().len(), 1);

        assert!(store.update_data(&id, data("c", 5)).is_err());
        assert_eq!(store.get(&id).unwrap().data, data("a", 60));
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(Error::Json(_))));
    }
}
