//! Key-value persistence backends.
//!
//! The project store keeps its whole state under a single key. `FileStorage`
//! maps each key to `<dir>/<key>.json`; `MemoryStorage` keeps values in a map
//! and backs the tests.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use crate::error::Result;

/// A string key-value store. Reads of missing keys yield `None`.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Move the value under `key` somewhere a later `set` cannot overwrite
    /// it. Returns where it went, or `None` if nothing was stored.
    fn set_aside(&mut self, key: &str) -> Result<Option<String>>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic-ish write via temp + rename.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Rename `<key>.json` to `<key>.json.bak`, or `.bak.N` if that is taken.
    fn set_aside(&mut self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let mut backup = path.with_extension("json.bak");
        let mut n = 1;
        while backup.exists() {
            backup = path.with_extension(format!("json.bak.{n}"));
            n += 1;
        }
        fs::rename(&path, &backup)?;
        Ok(Some(backup.display().to_string()))
    }
}

/// In-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_aside(&mut self, key: &str) -> Result<Option<String>> {
        let Some(value) = self.values.remove(key) else {
            return Ok(None);
        };
        let backup = format!("{key}.bak");
        self.values.insert(backup.clone(), value);
        Ok(Some(backup))
    }
}
