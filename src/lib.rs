//! # ftptree: folders and files over FTP
//!
//! A hierarchical view of an FTP server: a [`Client`] hands out a root
//! [`Folder`], folders list [`File`]s, sub-folders and generic [`Entry`]
//! records, and files read and write their content as streams, bytes or
//! text.
//!
//! The [`ConnectionManager`] behind a client holds at most one control
//! connection. Navigation (entering and listing folders) connects lazily
//! and keeps the connection for the next call. Transfers (download, upload,
//! delete) each run on a connection of their own that is closed before the
//! call returns.
//!
//! ```no_run
//! # async fn demo() -> ftptree::FtpResult<()> {
//! let client = ftptree::get_client("ftp.example.org", 21, "anonymous", "guest@");
//! for file in client.root_folder().list_files().await? {
//!     println!("{} ({:?} bytes)", file.name(), file.size());
//! }
//! let readme = client.get_file_text("/pub/", "README").await?;
//! client.close().await;
//! # let _ = readme;
//! # Ok(())
//! # }
//! ```
//!
//! Handles are cheap to clone but do not keep the client alive. Concurrent
//! calls on one client are serialized per call; a `set_current_folder`
//! followed by `list` from two tasks at once may interleave.

pub mod client;
pub mod codec;
pub mod engine;
pub mod entry;
pub mod error;
pub mod file;
pub mod folder;
pub mod manager;
pub mod path;
pub mod streams;

pub use client::{get_client, Client};
pub use engine::{EngineSession, NetworkEngine, TransferEngine};
pub use entry::{Entry, Node};
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use file::File;
pub use folder::Folder;
pub use manager::ConnectionManager;
pub use streams::{InputStream, OutputStream};

pub use ftptree_wire::{FtpConnectionConfig, FtpEntry, FtpEntryKind};
pub use secrecy::{ExposeSecret, SecretString};
