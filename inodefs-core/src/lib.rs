//! Inode Filesystem Emulator Core
//!
//! This crate emulates a minimal hierarchical filesystem on top of a host
//! directory:
//! - Inode table: fixed-capacity allocation record, persisted as `inodes_list`
//! - Directory entry codec: 36-byte records with a fixed 32-byte name field
//! - Content store: one byte object per inode, named by its number
//! - Operations engine: lookup, make-directory, make-file, change-directory
//!
//! # Architecture
//!
//! - `ContentStore` trait: byte-level object storage (host files or memory)
//! - `dir_log`: append-only view of a directory's content
//! - `FileSystem`: owns the table, the store and the current-directory cursor

pub mod config;
pub mod dir_log;
pub mod dirent;
pub mod error;
pub mod filesystem;
pub mod inode;
pub mod store;

pub use config::{FsConfig, DEFAULT_TABLE_FILE};
pub use dir_log::DirEntries;
pub use dirent::{DirEntry, ListedEntry, NameField, DIRENT_SIZE, NAME_LEN};
pub use error::{FsError, FsResult};
pub use filesystem::FileSystem;
pub use inode::{Ino, InodeKind, InodeRecord, InodeTable, MAX_INODES};
pub use store::{ContentStore, HostStore, MemoryStore, WriteMode};
