//! File handles.

use crate::codec;
use crate::error::FtpResult;
use crate::manager::{attached, ConnectionManager};
use crate::path::compose_path;
use crate::streams::{create_byte_array_input_stream, InputStream};
use ftptree_wire::FtpEntry;
use std::sync::Weak;

/// A remote file at `path + name`.
///
/// Every content operation is a single-shot transfer on a connection of
/// its own.
#[derive(Debug, Clone)]
pub struct File {
    manager: Weak<ConnectionManager>,
    record: Option<FtpEntry>,
    path: String,
    name: String,
}

impl File {
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

    /// Directory component, normally ending in `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_path(&self) -> String {
        compose_path(&self.path, &self.name)
    }

    /// The listing record this handle was built from, if any.
    pub fn record(&self) -> Option<&FtpEntry> {
        self.record.as_ref()
    }

    /// Size reported by the listing.
    pub fn size(&self) -> Option<u64> {
        self.record.as_ref().map(|r| r.size)
    }

    pub fn is_file(&self) -> bool {
        true
    }

    pub fn is_folder(&self) -> bool {
        false
    }

    // ─── Content ─────────────────────────────────────────────────

    /// Download the file. The stream is invalid if the server would not
    /// hand it out.
    pub async fn get_content(&self) -> FtpResult<InputStream> {
        attached(&self.manager)?
            .get_file_stream(&self.path, &self.name)
            .await
    }

    pub async fn get_content_binary(&self) -> FtpResult<Option<Vec<u8>>> {
        read_binary(self.get_content().await?).await
    }

    pub async fn get_content_text(&self) -> FtpResult<Option<String>> {
        read_text(self.get_content().await?).await
    }

    /// Replace the file's content with everything `input` yields.
    pub async fn set_content(&self, input: InputStream) -> FtpResult<bool> {
        attached(&self.manager)?
            .create_file(&self.path, &self.name, input)
            .await
    }

    pub async fn set_content_binary(&self, content: impl Into<Vec<u8>>) -> FtpResult<bool> {
        self.set_content(create_byte_array_input_stream(content)).await
    }

    pub async fn set_content_text(&self, content: &str) -> FtpResult<bool> {
        self.set_content_binary(codec::text_to_bytes(content)).await
    }

    pub async fn delete(&self) -> FtpResult<bool> {
        attached(&self.manager)?
            .delete_file(&self.path, &self.name)
            .await
    }
}

/// Drain a downloaded stream; `None` when it is invalid.
pub(crate) async fn read_binary(mut stream: InputStream) -> FtpResult<Option<Vec<u8>>> {
    if !stream.is_valid() {
        return Ok(None);
    }
    let bytes = stream.read_bytes().await?;
    stream.close();
    Ok(Some(bytes))
}

pub(crate) async fn read_text(stream: InputStream) -> FtpResult<Option<String>> {
    match read_binary(stream).await? {
        Some(bytes) => codec::bytes_to_text(&bytes).map(Some),
        None => Ok(None),
    }
}
