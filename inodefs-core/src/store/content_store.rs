//! ContentStore trait - byte-level backing objects, one per inode.

use std::io::{Read, Write};

use crate::inode::Ino;

/// How a writer opens an inode's content object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or empty the object, then write from the start.
    Truncate,
    /// Create if missing, then write at the end.
    Append,
}

/// Backing storage for inode content.
/// Imposes no structure; directories and files are interpreted by callers.
pub trait ContentStore {
    /// Open an inode's content for reading. Fails if the object does not exist.
    fn reader(&self, ino: Ino) -> std::io::Result<Box<dyn Read + '_>>;

    /// Open an inode's content for writing.
    fn writer(&mut self, ino: Ino, mode: WriteMode) -> std::io::Result<Box<dyn Write + '_>>;

    /// Check if an inode has a content object.
    fn exists(&self, ino: Ino) -> bool;
}
