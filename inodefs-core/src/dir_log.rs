//! Directory content as an append-only log of entries.
//!
//! A directory can only be scanned front to back or extended at the end.
//! Entries are never edited or removed.

use std::io::{Read, Write};

use tracing::debug;

use crate::dirent::{Decoded, DirEntry};
use crate::error::FsResult;
use crate::inode::Ino;
use crate::store::{ContentStore, WriteMode};

/// Sequential scan over a directory's entries in storage order.
///
/// Ends at the first short record. A read error is yielded once, then the
/// scan stops.
pub struct DirEntries<R> {
    reader: R,
    dir: Ino,
    done: bool,
}

impl<R: Read> DirEntries<R> {
    pub fn new(dir: Ino, reader: R) -> Self {
        Self {
            reader,
            dir,
            done: false,
        }
    }
}

impl<R: Read> Iterator for DirEntries<R> {
    type Item = FsResult<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match DirEntry::decode(&mut self.reader) {
            Ok(Decoded::Entry(entry)) => Some(Ok(entry)),
            Ok(Decoded::End) => {
                self.done = true;
                None
            }
            Ok(Decoded::Truncated { bytes }) => {
                debug!(dir = %self.dir, bytes, "ignoring partial directory record");
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

/// Scan `dir` from the beginning. Each call reopens the content object.
pub fn scan<S: ContentStore + ?Sized>(
    store: &S,
    dir: Ino,
) -> FsResult<DirEntries<Box<dyn Read + '_>>> {
    Ok(DirEntries::new(dir, store.reader(dir)?))
}

/// Append one entry to the end of `dir`.
///
/// Not transactional: a failed write may leave a partial record behind.
pub fn append<S: ContentStore + ?Sized>(
    store: &mut S,
    dir: Ino,
    entry: &DirEntry,
) -> FsResult<()> {
    let mut writer = store.writer(dir, WriteMode::Append)?;
    entry.write_to(&mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn collect(store: &MemoryStore, dir: Ino) -> Vec<DirEntry> {
        scan(store, dir).unwrap().map(|e| e.unwrap()).collect()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = MemoryStore::with_root();
        append(&mut store, Ino::ROOT, &DirEntry::new(Ino(1), "b")).unwrap();
        append(&mut store, Ino::ROOT, &DirEntry::new(Ino(2), "a")).unwrap();

        assert_eq!(
            collect(&store, Ino::ROOT),
            vec![DirEntry::new(Ino(1), "b"), DirEntry::new(Ino(2), "a")]
        );
    }

    #[test]
    fn test_scan_stops_at_partial_record() {
        let mut store = MemoryStore::with_root();
        append(&mut store, Ino::ROOT, &DirEntry::new(Ino(1), "one")).unwrap();
        let mut data = store.get(Ino::ROOT).unwrap().to_vec();
        data.extend_from_slice(&DirEntry::new(Ino(2), "two").encode()[..10]);
        store.insert(Ino::ROOT, data);

        assert_eq!(collect(&store, Ino::ROOT), vec![DirEntry::new(Ino(1), "one")]);
    }

    #[test]
    fn test_scan_is_restartable() {
        let mut store = MemoryStore::with_root();
        append(&mut store, Ino::ROOT, &DirEntry::new(Ino(1), "x")).unwrap();

        assert_eq!(scan(&store, Ino::ROOT).unwrap().count(), 1);
        assert_eq!(scan(&store, Ino::ROOT).unwrap().count(), 1);
    }

    #[test]
    fn test_scan_missing_directory() {
        let store = MemoryStore::new();
        assert!(scan(&store, Ino(5)).is_err());
    }
}
