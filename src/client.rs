//! Top-level entry point.

use crate::codec;
use crate::engine::{NetworkEngine, TransferEngine};
use crate::error::{FtpError, FtpResult};
use crate::file::{read_binary, read_text};
use crate::folder::Folder;
use crate::manager::ConnectionManager;
use crate::streams::{create_byte_array_input_stream, InputStream};
use ftptree_wire::FtpConnectionConfig;
use log::debug;
use std::sync::Arc;

/// Connect-on-demand FTP client with a tree view of the server.
///
/// Owns the only strong reference to its `ConnectionManager`. Folder and
/// file handles it hands out stop working once the client is closed or
/// dropped.
#[derive(Debug)]
pub struct Client {
    manager: Arc<ConnectionManager>,
}

/// A client for `host:port` with default settings. Nothing is sent until
/// the first operation.
pub fn get_client(
    host: impl Into<String>,
    port: u16,
    username: impl Into<String>,
    password: impl Into<String>,
) -> Client {
    Client::with_config(FtpConnectionConfig::new(host, port, username, password))
}

impl Client {
    pub fn with_config(config: FtpConnectionConfig) -> Self {
        Self::with_engine(Arc::new(NetworkEngine), config)
    }

    pub fn with_engine(engine: Arc<dyn TransferEngine>, config: FtpConnectionConfig) -> Self {
        Self {
            manager: Arc::new(ConnectionManager::new(engine, config)),
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn root_folder(&self) -> Folder {
        Folder::new(Arc::downgrade(&self.manager), None, "/", "/")
    }

    // ─── Files ───────────────────────────────────────────────────

    pub async fn get_file(&self, path: &str, name: &str) -> FtpResult<InputStream> {
        self.manager.get_file_stream(path, name).await
    }

    pub async fn get_file_binary(&self, path: &str, name: &str) -> FtpResult<Option<Vec<u8>>> {
        read_binary(self.get_file(path, name).await?).await
    }

    pub async fn get_file_text(&self, path: &str, name: &str) -> FtpResult<Option<String>> {
        read_text(self.get_file(path, name).await?).await
    }

    pub async fn create_file(&self, path: &str, name: &str, input: InputStream) -> FtpResult<bool> {
        self.manager.create_file(path, name, input).await
    }

    pub async fn create_file_binary(
        &self,
        path: &str,
        name: &str,
        content: impl Into<Vec<u8>>,
    ) -> FtpResult<bool> {
        self.create_file(path, name, create_byte_array_input_stream(content))
            .await
    }

    pub async fn create_file_text(&self, path: &str, name: &str, content: &str) -> FtpResult<bool> {
        self.create_file_binary(path, name, codec::text_to_bytes(content))
            .await
    }

    // ─── Folders ─────────────────────────────────────────────────

    /// A handle on `path + name` if the server lets us enter it. On success
    /// the control connection stays parked inside the folder.
    pub async fn get_folder(&self, path: &str, name: &str) -> FtpResult<Option<Folder>> {
        if !self.manager.set_current_folder(path, name).await? {
            return Ok(None);
        }
        Ok(Some(Folder::new(
            Arc::downgrade(&self.manager),
            None,
            path,
            name,
        )))
    }

    pub async fn create_folder(&self, _path: &str, _name: &str) -> FtpResult<Folder> {
        Err(FtpError::not_implemented("Client::create_folder"))
    }

    /// Close the control connection. Handles obtained from this client
    /// fail with `Disconnected` afterwards.
    pub async fn close(self) {
        debug!("Closing client for {}", self.manager.config().host);
        self.manager.close().await;
    }
}
