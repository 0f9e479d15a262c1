//! Folder handles.
//!
//! Listing a folder always moves the shared control connection into it
//! first, then lists the working directory. Nothing is cached between
//! calls.

use crate::codec;
use crate::entry::Entry;
use crate::error::{FtpError, FtpResult};
use crate::file::File;
use crate::manager::{attached, ConnectionManager};
use crate::path::{child_directory, compose_path};
use crate::streams::{create_byte_array_input_stream, InputStream};
use ftptree_wire::FtpEntry;
use log::debug;
use std::sync::Weak;

/// A remote directory at `path + name`.
#[derive(Debug, Clone)]
pub struct Folder {
    manager: Weak<ConnectionManager>,
    record: Option<FtpEntry>,
    path: String,
    name: String,
}

impl Folder {
    pub(crate) fn new(
        manager: Weak<ConnectionManager>,
        record: Option<FtpEntry>,
        path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            record,
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_path(&self) -> String {
        compose_path(&self.path, &self.name)
    }

    /// Directory component handed to children of this folder.
    pub fn child_path(&self) -> String {
        child_directory(&self.path, &self.name)
    }

    pub fn record(&self) -> Option<&FtpEntry> {
        self.record.as_ref()
    }

    pub fn is_file(&self) -> bool {
        false
    }

    pub fn is_folder(&self) -> bool {
        true
    }

    // ─── Listing ─────────────────────────────────────────────────

    async fn entered_listing(&self) -> FtpResult<Vec<FtpEntry>> {
        let manager = attached(&self.manager)?;
        if !manager.set_current_folder(&self.path, &self.name).await? {
            debug!("Folder {} is gone, listing nothing", self.full_path());
            return Ok(Vec::new());
        }
        manager.list().await
    }

    /// Every record in the folder, whatever its kind.
    pub async fn list(&self) -> FtpResult<Vec<Entry>> {
        let parent = self.child_path();
        Ok(self
            .entered_listing()
            .await?
            .into_iter()
            .map(|record| Entry::new(self.manager.clone(), record, parent.clone()))
            .collect())
    }

    pub async fn list_files(&self) -> FtpResult<Vec<File>> {
        let parent = self.child_path();
        Ok(self
            .entered_listing()
            .await?
            .into_iter()
            .filter(FtpEntry::is_file)
            .map(|record| {
                let name = record.name.clone();
                File::new(self.manager.clone(), Some(record), parent.clone(), name)
            })
            .collect())
    }

    pub async fn list_folders(&self) -> FtpResult<Vec<Folder>> {
        let parent = self.child_path();
        Ok(self
            .entered_listing()
            .await?
            .into_iter()
            .filter(FtpEntry::is_directory)
            .map(|record| {
                let name = record.name.clone();
                Folder::new(self.manager.clone(), Some(record), parent.clone(), name)
            })
            .collect())
    }

    /// Linear scan of `list_files` for `name`.
    pub async fn get_file(&self, name: &str) -> FtpResult<Option<File>> {
        Ok(self
            .list_files()
            .await?
            .into_iter()
            .find(|file| file.name() == name))
    }

    pub async fn get_folder(&self, _name: &str) -> FtpResult<Folder> {
        Err(FtpError::not_implemented("Folder::get_folder"))
    }

    // ─── Mutation ────────────────────────────────────────────────

    /// Upload `input` as a child file, then look the new file up again.
    /// `Ok(None)` when the server refused the upload.
    pub async fn create_file(&self, name: &str, input: InputStream) -> FtpResult<Option<File>> {
        let stored = attached(&self.manager)?
            .create_file(&self.child_path(), name, input)
            .await?;
        if !stored {
            return Ok(None);
        }
        self.get_file(name).await
    }

    pub async fn create_file_binary(
        &self,
        name: &str,
        content: impl Into<Vec<u8>>,
    ) -> FtpResult<Option<File>> {
        self.create_file(name, create_byte_array_input_stream(content))
            .await
    }

    pub async fn create_file_text(&self, name: &str, content: &str) -> FtpResult<Option<File>> {
        self.create_file_binary(name, codec::text_to_bytes(content))
            .await
    }

    pub async fn create_folder(&self, _name: &str) -> FtpResult<Folder> {
        Err(FtpError::not_implemented("Folder::create_folder"))
    }

    /// Delete this folder's own path.
    pub async fn delete(&self) -> FtpResult<bool> {
        attached(&self.manager)?
            .delete_file(&self.path, &self.name)
            .await
    }

    pub async fn delete_file(&self, name: &str) -> FtpResult<bool> {
        attached(&self.manager)?
            .delete_file(&self.child_path(), name)
            .await
    }

    pub async fn delete_folder(&self, _name: &str) -> FtpResult<bool> {
        Err(FtpError::not_implemented("Folder::delete_folder"))
    }
}
