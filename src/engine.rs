//! The seam between the tree layer and whatever speaks FTP.
//!
//! `ConnectionManager` only ever holds a `Box<dyn EngineSession>`, opened
//! through a `TransferEngine`. `NetworkEngine` is the real implementation
//! on top of `ftptree-wire`.

use crate::error::FtpResult;
use async_trait::async_trait;
use ftptree_wire::{FtpClient, FtpConnectionConfig, FtpEntry};
use tokio::io::AsyncRead;

/// Opens authenticated control connections.
#[async_trait]
pub trait TransferEngine: Send + Sync {
    async fn connect(&self, config: &FtpConnectionConfig) -> FtpResult<Box<dyn EngineSession>>;
}

/// One live control connection.
///
/// Refusals from the server (`CWD` into a missing directory, `RETR` of a
/// missing file, ...) are `Ok(false)` / `Ok(None)`; errors are reserved for
/// transport and protocol failures.
#[async_trait]
pub trait EngineSession: Send {
    /// Stable identity of this connection, for diagnostics.
    fn id(&self) -> &str;

    fn is_connected(&self) -> bool;

    async fn disconnect(&mut self) -> FtpResult<()>;

    async fn print_working_directory(&mut self) -> FtpResult<String>;

    async fn change_working_directory(&mut self, path: &str) -> FtpResult<bool>;

    /// Listing of the current working directory.
    async fn list_files(&mut self) -> FtpResult<Vec<FtpEntry>>;

    async fn retrieve_file(&mut self, path: &str) -> FtpResult<Option<Vec<u8>>>;

    async fn store_file(
        &mut self,
        path: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> FtpResult<bool>;

    async fn delete_file(&mut self, path: &str) -> FtpResult<bool>;
}

/// Real FTP over TCP.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkEngine;

#[async_trait]
impl TransferEngine for NetworkEngine {
    async fn connect(&self, config: &FtpConnectionConfig) -> FtpResult<Box<dyn EngineSession>> {
        let client = FtpClient::connect(config.clone()).await?;
        Ok(Box::new(client))
    }
}

#[async_trait]
impl EngineSession for FtpClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_connected(&self) -> bool {
        FtpClient::is_connected(self)
    }

    async fn disconnect(&mut self) -> FtpResult<()> {
        self.quit().await
    }

    async fn print_working_directory(&mut self) -> FtpResult<String> {
        self.pwd().await
    }

    async fn change_working_directory(&mut self, path: &str) -> FtpResult<bool> {
        self.change_dir(path).await
    }

    async fn list_files(&mut self) -> FtpResult<Vec<FtpEntry>> {
        self.list().await
    }

    async fn retrieve_file(&mut self, path: &str) -> FtpResult<Option<Vec<u8>>> {
        self.retrieve(path).await
    }

    async fn store_file(
        &mut self,
        path: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> FtpResult<bool> {
        self.store(path, content).await
    }

    async fn delete_file(&mut self, path: &str) -> FtpResult<bool> {
        self.delete(path).await
    }
}
