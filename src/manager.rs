//! Connection manager: owns at most one control connection per client.
//!
//! Navigation (`current_folder`, `set_current_folder`, `list`) connects
//! lazily and keeps the connection parked for the next call. Transfers
//! (`get_file_stream`, `create_file`, `delete_file`) always drop whatever
//! is parked, run on a fresh connection and close it again before
//! returning, whatever the outcome.

use crate::engine::{EngineSession, TransferEngine};
use crate::error::{FtpError, FtpResult};
use crate::path::compose_path;
use crate::streams::{create_byte_array_input_stream, InputStream};
use ftptree_wire::{FtpConnectionConfig, FtpEntry};
use futures::future::BoxFuture;
use log::{debug, info, warn};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

/// A parked connection and the directory it was last moved into.
struct Session {
    handle: Box<dyn EngineSession>,
    working_directory: Option<String>,
}

pub struct ConnectionManager {
    config: FtpConnectionConfig,
    engine: Arc<dyn TransferEngine>,
    session: Mutex<Option<Session>>,
}

impl ConnectionManager {
    pub fn new(engine: Arc<dyn TransferEngine>, config: FtpConnectionConfig) -> Self {
        Self {
            config,
            engine,
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &FtpConnectionConfig {
        &self.config
    }

    fn target(&self) -> &str {
        self.config.label.as_deref().unwrap_or(&self.config.host)
    }

    // ─── Connection lifecycle ────────────────────────────────────

    async fn open(&self) -> FtpResult<Session> {
        debug!(
            "Opening control connection to {} ({}:{})",
            self.target(),
            self.config.host,
            self.config.port
        );
        let handle = self.engine.connect(&self.config).await?;
        info!("FTP session {} opened to {}", handle.id(), self.target());
        Ok(Session {
            handle,
            working_directory: None,
        })
    }

    async fn release(&self, mut session: Session) {
        let id = session.handle.id().to_string();
        if !session.handle.is_connected() {
            debug!("FTP session {} already down", id);
            return;
        }
        match session.handle.disconnect().await {
            Ok(()) => info!("FTP session {} closed", id),
            Err(e) => warn!("FTP session {} did not close cleanly: {}", id, e),
        }
    }

    /// Reuse the parked connection if it is still live, otherwise open one.
    async fn ensure_connected<'a>(&self, slot: &'a mut Option<Session>) -> FtpResult<&'a mut Session> {
        let live = slot.as_ref().map_or(false, |s| s.handle.is_connected());
        if live {
            debug!("Reusing parked connection to {}", self.target());
        } else {
            if let Some(stale) = slot.take() {
                self.release(stale).await;
            }
            *slot = Some(self.open().await?);
        }
        slot.as_mut()
            .ok_or_else(|| FtpError::disconnected("No control connection"))
    }

    /// Run `op` on a connection of its own, closing it on every exit path.
    async fn single_shot<T, F>(&self, op: F) -> FtpResult<T>
    where
        F: for<'s> FnOnce(&'s mut Box<dyn EngineSession>) -> BoxFuture<'s, FtpResult<T>>,
    {
        let mut slot = self.session.lock().await;
        if let Some(parked) = slot.take() {
            debug!("Dropping parked connection before transfer");
            self.release(parked).await;
        }
        let mut fresh = self.open().await?;
        let result = op(&mut fresh.handle).await;
        self.release(fresh).await;
        result
    }

    /// Close the parked connection, if any. Safe to call repeatedly.
    pub async fn close(&self) {
        let parked = self.session.lock().await.take();
        if let Some(session) = parked {
            self.release(session).await;
        }
    }

    // ─── Diagnostics ─────────────────────────────────────────────

    pub async fn is_connected(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .map_or(false, |s| s.handle.is_connected())
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.handle.id().to_string())
    }

    /// Directory the parked connection was last moved into by
    /// `set_current_folder`.
    pub async fn working_directory(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .and_then(|s| s.working_directory.clone())
    }

    // ─── Navigation (lazy, reused) ───────────────────────────────

    pub async fn current_folder(&self) -> FtpResult<String> {
        let mut slot = self.session.lock().await;
        let session = self.ensure_connected(&mut slot).await?;
        session.handle.print_working_directory().await
    }

    /// Move the parked connection into `path + name`. `Ok(false)` when the
    /// server refuses; the recorded directory is then left unchanged.
    pub async fn set_current_folder(&self, path: &str, name: &str) -> FtpResult<bool> {
        let full = compose_path(path, name);
        let mut slot = self.session.lock().await;
        let session = self.ensure_connected(&mut slot).await?;
        let moved = session.handle.change_working_directory(&full).await?;
        if moved {
            session.working_directory = Some(full);
        } else {
            debug!("CWD {} refused on {}", full, self.target());
        }
        Ok(moved)
    }

    /// Listing of the current working directory.
    pub async fn list(&self) -> FtpResult<Vec<FtpEntry>> {
        let mut slot = self.session.lock().await;
        let session = self.ensure_connected(&mut slot).await?;
        session.handle.list_files().await
    }

    // ─── Transfers (single-shot) ─────────────────────────────────

    /// Download `path + name` into memory. A file the server will not hand
    /// out comes back as an invalid stream.
    pub async fn get_file_stream(&self, path: &str, name: &str) -> FtpResult<InputStream> {
        let full = compose_path(path, name);
        let remote = full.clone();
        let content = self
            .single_shot(move |s| Box::pin(async move { s.retrieve_file(&remote).await }))
            .await?;
        match content {
            Some(bytes) => {
                debug!("Downloaded {} ({} bytes)", full, bytes.len());
                Ok(create_byte_array_input_stream(bytes))
            }
            None => Ok(InputStream::invalid()),
        }
    }

    /// Upload `input` as `path + name`. `Ok(false)` when the server refuses.
    pub async fn create_file(&self, path: &str, name: &str, input: InputStream) -> FtpResult<bool> {
        let full = compose_path(path, name);
        let mut reader = input
            .into_reader()
            .ok_or_else(|| FtpError::invalid_stream(format!("Cannot upload {} from an invalid stream", full)))?;
        self.single_shot(move |s| Box::pin(async move { s.store_file(&full, &mut *reader).await }))
            .await
    }

    /// Delete `path + name`. `Ok(false)` when the server refuses.
    pub async fn delete_file(&self, path: &str, name: &str) -> FtpResult<bool> {
        let full = compose_path(path, name);
        self.single_shot(move |s| Box::pin(async move { s.delete_file(&full).await }))
            .await
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("username", &self.config.username)
            .finish()
    }
}

/// Resolve a handle's back-reference to its manager.
pub(crate) fn attached(manager: &Weak<ConnectionManager>) -> FtpResult<Arc<ConnectionManager>> {
    manager
        .upgrade()
        .ok_or_else(|| FtpError::disconnected("Client has been closed"))
}
