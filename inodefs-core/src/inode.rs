//! Inode table - fixed-capacity allocation record of inode numbers and their kinds.
//!
//! On disk the table is a flat sequence of 5-byte records with no header:
//! - Bytes 0-3: inode index (u32, little-endian)
//! - Byte 4: kind tag (`d` or `f`)
//!
//! Only in-use slots are written. A trailing partial record is dropped on load.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{FsError, FsResult};

/// Number of slots in the inode table.
pub const MAX_INODES: usize = 1024;

/// Size of one on-disk table record.
pub const TABLE_RECORD_SIZE: usize = 5;

/// Inode number. Only meaningful against the table that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Ino(pub u32);

impl Ino {
    /// The root directory.
    pub const ROOT: Ino = Ino(0);

    pub fn get(self) -> u32 {
        self.0
    }

    /// Slot index, if the number falls inside the table.
    fn slot(self) -> Option<usize> {
        let idx = self.0 as usize;
        (idx < MAX_INODES).then_some(idx)
    }
}

impl fmt::Display for Ino {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type of the object an inode refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InodeKind {
    Directory,
    File,
}

impl InodeKind {
    /// On-disk tag byte.
    pub fn tag(self) -> u8 {
        match self {
            InodeKind::Directory => b'd',
            InodeKind::File => b'f',
        }
    }
}

impl TryFrom<u8> for InodeKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'd' => Ok(Self::Directory),
            b'f' => Ok(Self::File),
            _ => Err(value),
        }
    }
}

/// One in-use slot of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeRecord {
    pub ino: Ino,
    pub kind: InodeKind,
}

/// Fixed-capacity inode table. A slot is in use when it holds a kind.
#[derive(Clone)]
pub struct InodeTable {
    slots: Box<[Option<InodeKind>; MAX_INODES]>,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InodeTable")
            .field("in_use", &self.in_use_count())
            .finish()
    }
}

impl InodeTable {
    /// Create an empty table with every slot free.
    pub fn new() -> Self {
        Self {
            slots: Box::new([None; MAX_INODES]),
        }
    }

    /// Create a table holding only the root directory.
    pub fn with_root() -> Self {
        let mut table = Self::new();
        table.slots[0] = Some(InodeKind::Directory);
        table
    }

    /// Kind of an in-use inode. `None` if the slot is free or out of range.
    pub fn get(&self, ino: Ino) -> Option<InodeKind> {
        self.slots[ino.slot()?]
    }

    pub fn is_directory(&self, ino: Ino) -> bool {
        self.get(ino) == Some(InodeKind::Directory)
    }

    /// Number of slots in use.
    pub fn in_use_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// In-use slots in ascending index order.
    pub fn records(&self) -> impl Iterator<Item = InodeRecord> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.map(|kind| InodeRecord {
                ino: Ino(i as u32),
                kind,
            })
        })
    }

    /// Claim the lowest free slot for a new inode of `kind`.
    pub fn allocate(&mut self, kind: InodeKind) -> FsResult<Ino> {
        let idx = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(FsError::ResourceExhausted)?;
        self.slots[idx] = Some(kind);
        debug!(ino = idx, ?kind, "allocated inode");
        Ok(Ino(idx as u32))
    }

    /// Return a slot that was allocated but never got content.
    pub(crate) fn release(&mut self, ino: Ino) {
        if let Some(idx) = ino.slot() {
            self.slots[idx] = None;
            debug!(ino = idx, "released inode");
        }
    }

    /// Check that inode 0 is an in-use directory.
    pub fn validate_root(&self) -> FsResult<()> {
        if self.is_directory(Ino::ROOT) {
            Ok(())
        } else {
            Err(FsError::InvalidBootstrap)
        }
    }

    /// Read a table from a record stream.
    ///
    /// Stops at end of stream or on a partial record. Records with an
    /// out-of-range index or unknown kind tag are skipped with a warning.
    pub fn load<R: Read>(mut reader: R) -> FsResult<Self> {
        let mut table = Self::new();
        let mut record = [0u8; TABLE_RECORD_SIZE];

        loop {
            let n = read_full(&mut reader, &mut record)?;
            if n < TABLE_RECORD_SIZE {
                if n > 0 {
                    debug!(bytes = n, "dropping partial inode table record");
                }
                break;
            }

            let index = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
            let tag = record[4];
            match (Ino(index).slot(), InodeKind::try_from(tag)) {
                (Some(idx), Ok(kind)) => table.slots[idx] = Some(kind),
                _ => warn!(
                    ino = index,
                    tag = %char::from(tag),
                    "ignoring invalid inode record"
                ),
            }
        }

        Ok(table)
    }

    /// Write every in-use slot, in ascending index order.
    pub fn save<W: Write>(&self, mut writer: W) -> FsResult<()> {
        for record in self.records() {
            let mut buf = [0u8; TABLE_RECORD_SIZE];
            buf[..4].copy_from_slice(&record.ino.0.to_le_bytes());
            buf[4] = record.kind.tag();
            writer.write_all(&buf)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load the table file at `path`. Fails only if it cannot be opened or read.
    pub fn load_from_path(path: &Path) -> FsResult<Self> {
        let file = File::open(path)?;
        let table = Self::load(BufReader::new(file))?;
        info!(path = %path.display(), in_use = table.in_use_count(), "loaded inode table");
        Ok(table)
    }

    /// Truncate and rewrite the table file at `path`.
    ///
    /// A failed write leaves the file truncated or partially written.
    pub fn save_to_path(&self, path: &Path) -> FsResult<()> {
        let file = File::create(path)?;
        self.save(BufWriter::new(file))?;
        info!(path = %path.display(), in_use = self.in_use_count(), "saved inode table");
        Ok(())
    }
}

/// Read until `buf` is full or the stream ends. Returns the byte count read.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
