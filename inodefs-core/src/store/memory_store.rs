//! In-memory content store.

use std::collections::{HashMap, HashSet};
use std::io::{Error, ErrorKind, Read, Write};

use super::content_store::{ContentStore, WriteMode};
use crate::inode::Ino;

/// Content objects held in memory, keyed by inode number.
#[derive(Default, Clone)]
pub struct MemoryStore {
    objects: HashMap<Ino, Vec<u8>>,
    read_only: HashSet<Ino>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with an empty root directory object.
    pub fn with_root() -> Self {
        let mut store = Self::new();
        store.insert(Ino::ROOT, Vec::new());
        store
    }

    /// Replace an object's content (convenience method).
    pub fn insert(&mut self, ino: Ino, data: impl Into<Vec<u8>>) {
        self.objects.insert(ino, data.into());
    }

    /// Raw content of an object.
    pub fn get(&self, ino: Ino) -> Option<&[u8]> {
        self.objects.get(&ino).map(|v| v.as_slice())
    }

    /// Make every later writer for `ino` fail with `PermissionDenied`.
    pub fn set_read_only(&mut self, ino: Ino, read_only: bool) {
        if read_only {
            self.read_only.insert(ino);
        } else {
            self.read_only.remove(&ino);
        }
    }
}

impl ContentStore for MemoryStore {
    fn reader(&self, ino: Ino) -> std::io::Result<Box<dyn Read + '_>> {
        match self.objects.get(&ino) {
            Some(data) => Ok(Box::new(data.as_slice())),
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("no content object for inode {}", ino),
            )),
        }
    }

    fn writer(&mut self, ino: Ino, mode: WriteMode) -> std::io::Result<Box<dyn Write + '_>> {
        if self.read_only.contains(&ino) {
            return Err(Error::new(
                ErrorKind::PermissionDenied,
                format!("inode {} is read-only", ino),
            ));
        }
        let data = self.objects.entry(ino).or_default();
        if mode == WriteMode::Truncate {
            data.clear();
        }
        Ok(Box::new(data))
    }

    fn exists(&self, ino: Ino) -> bool {
        self.objects.contains_key(&ino)
    }
}
