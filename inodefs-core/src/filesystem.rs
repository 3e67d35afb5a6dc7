//! Filesystem operations engine.
//!
//! Combines the inode table, a content store and the directory codec into
//! name-relative operations on the current directory.

use std::io::{Read, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::config::FsConfig;
use crate::dir_log::{self, DirEntries};
use crate::dirent::{DirEntry, NameField, DIRENT_SIZE};
use crate::error::{FsError, FsResult};
use crate::inode::{Ino, InodeKind, InodeTable};
use crate::store::{ContentStore, HostStore, WriteMode};

/// Emulated filesystem state: inode table, content store and cursor.
pub struct FileSystem<S: ContentStore> {
    table: InodeTable,
    store: S,
    /// Current directory. Always an in-use directory.
    cwd: Ino,
    /// Where `shutdown` writes the table, if anywhere.
    table_path: Option<PathBuf>,
}

impl FileSystem<HostStore> {
    /// Open the filesystem stored under `config.root`.
    ///
    /// Fails with `Configuration` if the root is unusable, `Io` if the table
    /// cannot be opened and `InvalidBootstrap` if inode 0 is not a directory.
    pub fn mount(config: &FsConfig) -> FsResult<Self> {
        config.validate()?;
        let table_path = config.table_path();
        let table = InodeTable::load_from_path(&table_path)?;
        let mut fs = Self::new(table, HostStore::new(&config.root))?;
        fs.table_path = Some(table_path);
        Ok(fs)
    }
}

impl<S: ContentStore> FileSystem<S> {
    /// Start at inode 0, which must be an in-use directory.
    pub fn new(table: InodeTable, store: S) -> FsResult<Self> {
        table.validate_root()?;
        Ok(Self {
            table,
            store,
            cwd: Ino::ROOT,
            table_path: None,
        })
    }

    /// Current directory.
    pub fn cwd(&self) -> Ino {
        self.cwd
    }

    pub fn table(&self) -> &InodeTable {
        &self.table
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Find the first entry in `dir` whose name field equals `name`'s.
    ///
    /// Names are raw bytes; `&str`, `String` and byte slices all work.
    pub fn find(&self, dir: Ino, name: impl AsRef<[u8]>) -> FsResult<Option<Ino>> {
        let target = NameField::new(name);
        for entry in dir_log::scan(&self.store, dir)? {
            let entry = entry?;
            if entry.name == target {
                return Ok(Some(entry.ino));
            }
        }
        Ok(None)
    }

    /// Resolve `name` in `dir`.
    pub fn lookup(&self, dir: Ino, name: impl AsRef<[u8]>) -> FsResult<Ino> {
        let name = name.as_ref();
        self.find(dir, name)?
            .ok_or_else(|| FsError::NotFound(lossy(name)))
    }

    /// Append a `(child, name)` entry to `dir`. No duplicate check.
    pub fn append_entry(
        &mut self,
        dir: Ino,
        child: Ino,
        name: impl AsRef<[u8]>,
    ) -> FsResult<()> {
        dir_log::append(&mut self.store, dir, &DirEntry::new(child, name))
    }

    /// Entries of `dir` in storage order. Each call starts a fresh scan.
    pub fn list_directory(&self, dir: Ino) -> FsResult<DirEntries<Box<dyn Read + '_>>> {
        dir_log::scan(&self.store, dir)
    }

    /// Create directory `name` in the current directory.
    ///
    /// The new directory starts with `.` and `..` entries. If linking it into
    /// the parent fails, the inode and its content stay allocated.
    pub fn make_directory(&mut self, name: impl AsRef<[u8]>) -> FsResult<Ino> {
        let name = name.as_ref();
        if self.find(self.cwd, name)?.is_some() {
            return Err(FsError::AlreadyExists(lossy(name)));
        }

        let ino = self.table.allocate(InodeKind::Directory)?;
        let mut content = Vec::with_capacity(2 * DIRENT_SIZE);
        content.extend_from_slice(&DirEntry::new(ino, ".").encode());
        content.extend_from_slice(&DirEntry::new(self.cwd, "..").encode());
        self.create_content(ino, &content)?;

        self.append_entry(self.cwd, ino, name)?;
        debug!(%ino, parent = %self.cwd, name = %lossy(name), "created directory");
        Ok(ino)
    }

    /// Create file `name` in the current directory, or return the existing
    /// entry's inode if the name is already present.
    ///
    /// New files hold their name followed by a newline.
    pub fn make_file(&mut self, name: impl AsRef<[u8]>) -> FsResult<Ino> {
        let name = name.as_ref();
        if let Some(existing) = self.find(self.cwd, name)? {
            return Ok(existing);
        }

        let ino = self.table.allocate(InodeKind::File)?;
        let mut content = Vec::with_capacity(name.len() + 1);
        content.extend_from_slice(name);
        content.push(b'\n');
        self.create_content(ino, &content)?;

        self.append_entry(self.cwd, ino, name)?;
        debug!(%ino, parent = %self.cwd, name = %lossy(name), "created file");
        Ok(ino)
    }

    /// Move the cursor to directory `name`. On failure the cursor is unchanged.
    pub fn change_directory(&mut self, name: impl AsRef<[u8]>) -> FsResult<Ino> {
        let name = name.as_ref();
        let ino = self.lookup(self.cwd, name)?;
        if !self.table.is_directory(ino) {
            return Err(FsError::NotADirectory(lossy(name)));
        }
        debug!(from = %self.cwd, to = %ino, "changed directory");
        self.cwd = ino;
        Ok(ino)
    }

    /// Write a new inode's initial content.
    ///
    /// If the object cannot be opened the slot is released. Once bytes may
    /// have reached storage nothing is undone.
    fn create_content(&mut self, ino: Ino, content: &[u8]) -> FsResult<()> {
        let mut writer = match self.store.writer(ino, WriteMode::Truncate) {
            Ok(writer) => writer,
            Err(e) => {
                self.table.release(ino);
                return Err(e.into());
            }
        };
        writer.write_all(content)?;
        writer.flush()?;
        Ok(())
    }

    /// Persist the table and tear down. Stores without a table file just drop.
    pub fn shutdown(self) -> FsResult<()> {
        if let Some(path) = &self.table_path {
            self.table.save_to_path(path)?;
        }
        Ok(())
    }

    /// Take back the table and store, skipping persistence.
    pub fn into_parts(self) -> (InodeTable, S) {
        (self.table, self.store)
    }
}

/// Name bytes as text for error messages and logs.
fn lossy(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirent::NAME_LEN;
    use crate::store::MemoryStore;

    fn memory_fs() -> FileSystem<MemoryStore> {
        FileSystem::new(InodeTable::with_root(), MemoryStore::with_root()).unwrap()
    }

    fn entries(fs: &FileSystem<MemoryStore>, dir: Ino) -> Vec<(u32, String)> {
        fs.list_directory(dir)
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                (e.ino.get(), e.name.to_string())
            })
            .collect()
    }

    #[test]
    fn test_new_requires_root_directory() {
        let result = FileSystem::new(InodeTable::new(), MemoryStore::with_root());
        assert!(matches!(result, Err(FsError::InvalidBootstrap)));
    }

    #[test]
    fn test_make_directory() {
        let mut fs = memory_fs();
        let ino = fs.make_directory("docs").unwrap();

        assert_eq!(ino, Ino(1));
        assert_eq!(fs.lookup(Ino::ROOT, "docs").unwrap(), ino);
        assert_eq!(fs.table().get(ino), Some(InodeKind::Directory));
        assert_eq!(
            entries(&fs, ino),
            vec![(1, ".".to_string()), (0, "..".to_string())]
        );
    }

    #[test]
    fn test_make_directory_twice() {
        let mut fs = memory_fs();
        fs.make_directory("a").unwrap();

        assert!(matches!(fs.make_directory("a"), Err(FsError::AlreadyExists(_))));
        assert_eq!(fs.table().in_use_count(), 2);
        assert_eq!(entries(&fs, Ino::ROOT).len(), 1);
    }

    #[test]
    fn test_make_file_idempotent() {
        let mut fs = memory_fs();
        let first = fs.make_file("notes").unwrap();
        let second = fs.make_file("notes").unwrap();

        assert_eq!(first, second);
        assert_eq!(entries(&fs, Ino::ROOT), vec![(1, "notes".to_string())]);
        assert_eq!(fs.store().get(first), Some(&b"notes\n"[..]));
        assert_eq!(fs.table().get(first), Some(InodeKind::File));
    }

    #[test]
    fn test_make_file_keeps_full_name_in_content() {
        let mut fs = memory_fs();
        let name = "x".repeat(40);
        let ino = fs.make_file(&name).unwrap();
        assert_eq!(fs.store().get(ino).unwrap().len(), 41);
    }

    #[test]
    fn test_change_directory_roundtrip() {
        let mut fs = memory_fs();
        let docs = fs.make_directory("docs").unwrap();

        assert_eq!(fs.change_directory("docs").unwrap(), docs);
        assert_eq!(fs.cwd(), docs);
        fs.change_directory("..").unwrap();
        assert_eq!(fs.cwd(), Ino::ROOT);
    }

    #[test]
    fn test_change_directory_errors_keep_cursor() {
        let mut fs = memory_fs();
        fs.make_file("plain").unwrap();

        assert!(matches!(fs.change_directory("missing"), Err(FsError::NotFound(_))));
        assert!(matches!(fs.change_directory("plain"), Err(FsError::NotADirectory(_))));
        assert_eq!(fs.cwd(), Ino::ROOT);
    }

    #[test]
    fn test_change_directory_rejects_dangling_entry() {
        let mut fs = memory_fs();
        fs.append_entry(Ino::ROOT, Ino(900), "ghost").unwrap();
        fs.append_entry(Ino::ROOT, Ino(5000), "far").unwrap();

        assert!(matches!(fs.change_directory("ghost"), Err(FsError::NotADirectory(_))));
        assert!(matches!(fs.change_directory("far"), Err(FsError::NotADirectory(_))));
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let mut fs = memory_fs();
        fs.append_entry(Ino::ROOT, Ino(3), "dup").unwrap();
        fs.append_entry(Ino::ROOT, Ino(4), "dup").unwrap();
        assert_eq!(fs.lookup(Ino::ROOT, "dup").unwrap(), Ino(3));
    }

    #[test]
    fn test_lookup_truncated_names_collide() {
        let mut fs = memory_fs();
        let exact = "n".repeat(NAME_LEN);
        let ino = fs.make_file(&exact).unwrap();

        let longer = format!("{}-other", exact);
        assert_eq!(fs.lookup(Ino::ROOT, &longer).unwrap(), ino);
        assert_eq!(fs.make_file(&longer).unwrap(), ino);
        assert!(matches!(fs.make_directory(&longer), Err(FsError::AlreadyExists(_))));
    }

    #[test]
    fn test_lookup_unreadable_directory() {
        let fs = memory_fs();
        assert!(matches!(fs.lookup(Ino(7), "x"), Err(FsError::Io(_))));
    }

    #[test]
    fn test_exhausted_inodes() {
        let mut table = InodeTable::with_root();
        while table.allocate(InodeKind::File).is_ok() {}
        let mut fs = FileSystem::new(table, MemoryStore::with_root()).unwrap();

        assert!(matches!(fs.make_directory("d"), Err(FsError::ResourceExhausted)));
        assert!(matches!(fs.make_file("f"), Err(FsError::ResourceExhausted)));
        assert!(entries(&fs, Ino::ROOT).is_empty());
    }

    #[test]
    fn test_unopenable_content_releases_inode() {
        let mut fs = memory_fs();
        fs.store_mut().set_read_only(Ino(1), true);

        assert!(matches!(fs.make_file("f"), Err(FsError::Io(_))));
        assert_eq!(fs.table().get(Ino(1)), None);
        assert!(entries(&fs, Ino::ROOT).is_empty());
    }

    #[test]
    fn test_failed_link_leaves_orphan() {
        let mut fs = memory_fs();
        fs.store_mut().set_read_only(Ino::ROOT, true);

        assert!(matches!(fs.make_directory("d"), Err(FsError::Io(_))));
        assert_eq!(fs.table().get(Ino(1)), Some(InodeKind::Directory));
        assert!(fs.store().exists(Ino(1)));
        assert!(entries(&fs, Ino::ROOT).is_empty());
    }

    #[test]
    fn test_byte_names() {
        let mut fs = memory_fs();
        let ino = fs.make_file(b"caf\xe9").unwrap();

        assert_eq!(fs.lookup(Ino::ROOT, b"caf\xe9").unwrap(), ino);
        assert!(matches!(fs.lookup(Ino::ROOT, "caf\u{e9}"), Err(FsError::NotFound(_))));
        assert_eq!(fs.store().get(ino), Some(&b"caf\xe9\n"[..]));
        match fs.change_directory(b"caf\xe9") {
            Err(FsError::NotADirectory(name)) => assert_eq!(name, "caf\u{fffd}"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_nested_directories() {
        let mut fs = memory_fs();
        fs.make_directory("a").unwrap();
        fs.change_directory("a").unwrap();
        let b = fs.make_directory("b").unwrap();
        fs.change_directory("b").unwrap();

        assert_eq!(fs.cwd(), b);
        fs.change_directory("..").unwrap();
        fs.change_directory("..").unwrap();
        assert_eq!(fs.cwd(), Ino::ROOT);
    }
}
