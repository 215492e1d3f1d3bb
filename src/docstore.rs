use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Named JSON documents, one per state file.
///
/// The dictionary and the packing-unit master own their backend through
/// this trait, so the directory-backed store can be swapped for an
/// in-memory one in tests.
pub trait DocumentStore {
    /// Raw contents of a document, or `None` when it does not exist or
    /// cannot be read.
    fn read(&self, name: &str) -> Option<String>;

    /// Writes a document in full. Returns `false` when the write failed;
    /// callers keep their in-memory state either way.
    fn write(&mut self, name: &str, contents: &str) -> bool;
}

/// Documents stored as `<name>.json` files under one data directory.
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl DocumentStore for DirStore {
    fn read(&self, name: &str) -> Option<String> {
        let path = self.path_for(name);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read document");
                None
            }
        }
    }

    fn write(&mut self, name: &str, contents: &str) -> bool {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Could not create data directory");
            return false;
        }
        let path = self.path_for(name);
        match fs::write(&path, contents) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not write document");
                false
            }
        }
    }
}

/// In-memory store for tests. `writes` records document names in the
/// order they were written so tests can assert exact write sequences.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    docs: std::collections::HashMap<String, String>,
    pub writes: Vec<String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a document, bypassing the write journal.
    pub fn with_doc(mut self, name: &str, contents: &str) -> Self {
        self.docs.insert(name.to_string(), contents.to_string());
        self
    }

    pub fn doc(&self, name: &str) -> Option<&str> {
        self.docs.get(name).map(String::as_str)
    }
}

#[cfg(test)]
impl DocumentStore for MemoryStore {
    fn read(&self, name: &str) -> Option<String> {
        self.docs.get(name).cloned()
    }

    fn write(&mut self, name: &str, contents: &str) -> bool {
        self.docs.insert(name.to_string(), contents.to_string());
        self.writes.push(name.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_journal() {
        let mut store = MemoryStore::new();
        assert!(store.read("stores").is_none());

        assert!(store.write("stores", "{}"));
        assert!(store.write("units", "{}"));
        assert_eq!(store.read("stores").as_deref(), Some("{}"));
        assert_eq!(store.writes, ["stores", "units"]);
    }

    #[test]
    fn test_dir_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::new(dir.path().join("data"));

        assert!(store.read("stores").is_none()); // nothing written yet
        assert!(store.write("stores", r#"{"stores":[]}"#));
        assert_eq!(store.read("stores").as_deref(), Some(r#"{"stores":[]}"#));
        assert!(dir.path().join("data").join("stores.json").exists());
    }
}
