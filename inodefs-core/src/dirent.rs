//! Directory entry codec.
//!
//! Layout (36 bytes):
//! - Bytes 0-3: Inode number (u32, little-endian)
//! - Bytes 4-35: Name field (zero-padded, unterminated if the name fills it)

use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};

use serde::Serialize;

use crate::inode::{read_full, Ino};

/// Width of the name field in bytes.
pub const NAME_LEN: usize = 32;

/// Size of a directory entry in bytes.
pub const DIRENT_SIZE: usize = 4 + NAME_LEN;

/// Fixed-width name field. Equality is raw byte equality over all 32 bytes,
/// so two names that agree on their first 32 bytes compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameField([u8; NAME_LEN]);

impl NameField {
    /// Encode a name: bytes up to the first NUL, truncated to 32 and zero-padded.
    pub fn new(name: impl AsRef<[u8]>) -> Self {
        Self::from_bytes(name.as_ref())
    }

    /// Encode raw name bytes. No UTF-8 requirement.
    pub fn from_bytes(name: &[u8]) -> Self {
        let mut raw = [0u8; NAME_LEN];
        for (dst, &src) in raw.iter_mut().zip(name.iter().take_while(|&&b| b != 0)) {
            *dst = src;
        }
        Self(raw)
    }

    pub fn from_raw(raw: [u8; NAME_LEN]) -> Self {
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; NAME_LEN] {
        &self.0
    }

    /// Meaningful bytes: up to the first zero, or all 32.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        &self.0[..end]
    }

    /// True when the field starts with a zero byte.
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// Name as text (lossy UTF-8).
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.trimmed())
    }
}

impl fmt::Debug for NameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameField({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for NameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("(empty)")
        } else {
            f.write_str(&self.to_string_lossy())
        }
    }
}

/// One record of a directory's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub ino: Ino,
    pub name: NameField,
}

/// Outcome of decoding one record from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Entry(DirEntry),
    /// Stream ended cleanly on a record boundary.
    End,
    /// Stream ended inside a record; `bytes` of it were present.
    Truncated { bytes: usize },
}

impl DirEntry {
    pub fn new(ino: Ino, name: impl AsRef<[u8]>) -> Self {
        Self {
            ino,
            name: NameField::new(name),
        }
    }

    /// Serialize to the on-disk record.
    pub fn encode(&self) -> [u8; DIRENT_SIZE] {
        let mut buf = [0u8; DIRENT_SIZE];
        buf[..4].copy_from_slice(&self.ino.0.to_le_bytes());
        buf[4..].copy_from_slice(self.name.as_bytes());
        buf
    }

    /// Write the encoded record in a single call.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.encode())
    }

    /// Read the next record. A short read yields `End` or `Truncated`.
    pub fn decode<R: Read>(reader: &mut R) -> std::io::Result<Decoded> {
        let mut ino = [0u8; 4];
        let n = read_full(reader, &mut ino)?;
        if n == 0 {
            return Ok(Decoded::End);
        }
        if n < ino.len() {
            return Ok(Decoded::Truncated { bytes: n });
        }

        let mut name = [0u8; NAME_LEN];
        let m = read_full(reader, &mut name)?;
        if m < NAME_LEN {
            return Ok(Decoded::Truncated { bytes: 4 + m });
        }

        Ok(Decoded::Entry(DirEntry {
            ino: Ino(u32::from_le_bytes(ino)),
            name: NameField::from_raw(name),
        }))
    }
}

/// Display form of an entry, as produced by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEntry {
    pub ino: Ino,
    pub name: String,
    /// The name field starts with a zero byte.
    pub empty: bool,
}

impl From<&DirEntry> for ListedEntry {
    fn from(entry: &DirEntry) -> Self {
        Self {
            ino: entry.ino,
            name: entry.name.to_string(),
            empty: entry.name.is_empty(),
        }
    }
}
