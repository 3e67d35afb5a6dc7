//! Host directory content store - one file per inode, named by its decimal number.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use tracing::info;

use super::content_store::{ContentStore, WriteMode};
use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::inode::{Ino, InodeTable};

/// Content objects stored as plain files inside the storage root.
#[derive(Debug, Clone)]
pub struct HostStore {
    root: PathBuf,
}

impl HostStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Host path of an inode's content object.
    pub fn object_path(&self, ino: Ino) -> PathBuf {
        self.root.join(ino.to_string())
    }

    /// Seed an empty filesystem: an empty root directory object and a table
    /// holding only inode 0. Refuses to overwrite an existing table.
    pub fn format(config: &FsConfig) -> FsResult<Self> {
        config.validate()?;
        let table_path = config.table_path();
        if table_path.exists() {
            return Err(FsError::AlreadyExists(table_path.display().to_string()));
        }

        let mut store = Self::new(&config.root);
        store.writer(Ino::ROOT, WriteMode::Truncate)?.flush()?;
        InodeTable::with_root().save_to_path(&table_path)?;
        info!(root = %config.root.display(), "formatted storage root");
        Ok(store)
    }
}

impl ContentStore for HostStore {
    fn reader(&self, ino: Ino) -> std::io::Result<Box<dyn Read + '_>> {
        let file = File::open(self.object_path(ino))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn writer(&mut self, ino: Ino, mode: WriteMode) -> std::io::Result<Box<dyn Write + '_>> {
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Truncate => options.write(true).truncate(true),
            WriteMode::Append => options.append(true),
        };
        Ok(Box::new(options.open(self.object_path(ino))?))
    }

    fn exists(&self, ino: Ino) -> bool {
        self.object_path(ino).is_file()
    }
}
