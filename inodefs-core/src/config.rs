//! Storage root configuration.

use std::path::{Path, PathBuf};

use crate::error::{FsError, FsResult};

/// Default name of the inode table file inside the storage root.
pub const DEFAULT_TABLE_FILE: &str = "inodes_list";

/// Where an emulated filesystem lives on the host.
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// Host directory holding the table file and one content object per inode.
    pub root: PathBuf,
    /// Table file name, relative to `root`.
    pub table_file: String,
}

impl FsConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            table_file: DEFAULT_TABLE_FILE.to_string(),
        }
    }

    /// Override the table file name.
    pub fn with_table_file(mut self, name: impl Into<String>) -> Self {
        self.table_file = name.into();
        self
    }

    /// Full path of the inode table file.
    pub fn table_path(&self) -> PathBuf {
        self.root.join(&self.table_file)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the storage root exists and is a directory.
    pub fn validate(&self) -> FsResult<()> {
        if !self.root.is_dir() {
            return Err(FsError::Configuration(format!(
                "'{}' is not a directory",
                self.root.display()
            )));
        }
        if self.table_file.is_empty() {
            return Err(FsError::Configuration("empty table file name".to_string()));
        }
        Ok(())
    }
}
