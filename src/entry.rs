//! Listing records not yet resolved into a file or a folder.

use crate::file::File;
use crate::folder::Folder;
use crate::manager::ConnectionManager;
use crate::path::compose_path;
use ftptree_wire::{FtpEntry, FtpEntryKind};
use std::sync::Weak;

/// A record from `Folder::list`.
#[derive(Debug, Clone)]
pub struct Entry {
    manager: Weak<ConnectionManager>,
    record: FtpEntry,
    path: String,
}

/// An entry resolved by kind.
#[derive(Debug, Clone)]
pub enum Node {
    File(File),
    Folder(Folder),
}

impl Entry {
    pub(crate) fn new(manager: Weak<ConnectionManager>, record: FtpEntry, path: impl Into<String>) -> Self {
        Self {
            manager,
            record,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn full_path(&self) -> String {
        compose_path(&self.path, &self.record.name)
    }

    pub fn record(&self) -> &FtpEntry {
        &self.record
    }

    pub fn kind(&self) -> FtpEntryKind {
        self.record.kind
    }

    pub fn is_file(&self) -> bool {
        self.record.is_file()
    }

    pub fn is_folder(&self) -> bool {
        self.record.is_directory()
    }

    /// A file handle, if the record is a file.
    pub fn get_file(&self) -> Option<File> {
        self.is_file().then(|| {
            File::new(
                self.manager.clone(),
                Some(self.record.clone()),
                self.path.clone(),
                self.record.name.clone(),
            )
        })
    }

    /// A folder handle, if the record is a directory.
    pub fn get_folder(&self) -> Option<Folder> {
        self.is_folder().then(|| {
            Folder::new(
                self.manager.clone(),
                Some(self.record.clone()),
                self.path.clone(),
                self.record.name.clone(),
            )
        })
    }

    /// `None` for symlinks and records the listing parser could not classify.
    pub fn resolve(&self) -> Option<Node> {
        match self.record.kind {
            FtpEntryKind::File => self.get_file().map(Node::File),
            FtpEntryKind::Directory => self.get_folder().map(Node::Folder),
            FtpEntryKind::Symlink | FtpEntryKind::Unknown => None,
        }
    }
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::File(f) => f.name(),
            Node::Folder(d) => d.name(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Node::File(f) => f.path(),
            Node::Folder(d) => d.path(),
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            Node::File(f) => Some(f),
            Node::Folder(_) => None,
        }
    }

    pub fn into_folder(self) -> Option<Folder> {
        match self {
            Node::Folder(d) => Some(d),
            Node::File(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: FtpEntryKind) -> Entry {
        Entry::new(Weak::new(), FtpEntry::new(name, kind), "/docs/")
    }

    #[test]
    fn file_records_resolve_to_files_only() {
        let e = entry("a.txt", FtpEntryKind::File);
        assert!(e.is_file() && !e.is_folder());
        assert!(e.get_folder().is_none());
        let file = e.resolve().and_then(Node::into_file).unwrap();
        assert_eq!(file.full_path(), "/docs/a.txt");
    }

    #[test]
    fn directory_records_resolve_to_folders_only() {
        let e = entry("2024", FtpEntryKind::Directory);
        assert!(e.get_file().is_none());
        let folder = e.get_folder().unwrap();
        assert_eq!(folder.child_path(), "/docs/2024/");
        assert!(matches!(e.resolve(), Some(Node::Folder(_))));
    }

    #[test]
    fn symlinks_do_not_resolve() {
        let e = entry("latest", FtpEntryKind::Symlink);
        assert!(!e.is_file() && !e.is_folder());
        assert!(e.resolve().is_none());
        assert_eq!(e.kind(), FtpEntryKind::Symlink);
    }
}
