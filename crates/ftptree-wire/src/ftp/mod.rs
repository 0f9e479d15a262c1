//! # ftptree-wire: FTP transfer engine
//!
//! The protocol side of ftptree: everything that actually speaks RFC 959
//! on a socket. The tree layer in the `ftptree` crate only drives it
//! through a handful of session operations.
//!
//! - **RFC 959**: control channel, USER/PASS, PWD/CWD, LIST, RETR/STOR/DELE
//! - **RFC 2428**: EPSV / EPRT data channels
//! - **RFC 3659**: MLSD listings
//! - **RFC 2389**: FEAT negotiation
//!
//! Architecture:
//! - `types`: config, replies, listing records, session info
//! - `error`: FTP-specific error type
//! - `protocol`: low-level command/response codec
//! - `connection`: TCP transport for the control connection
//! - `client`: stateful FTP client (login, CWD, TYPE, LIST, ...)
//! - `parser`: Unix/Windows/MLSD LIST response parsing
//! - `transfer`: data channel management (PASV/EPSV/PORT/EPRT)
//! - `file_ops`: RETR, STOR and DELE

pub mod types;
pub mod error;
pub mod protocol;
pub mod connection;
pub mod client;
pub mod parser;
pub mod transfer;
pub mod file_ops;

pub use types::*;
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use client::FtpClient;
