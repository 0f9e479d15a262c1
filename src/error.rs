//! Error type shared with the wire engine.
//!
//! "Not found" never surfaces here: missing files and folders come back as
//! `None`, `false` or an invalid stream.

pub use ftptree_wire::error::{FtpError, FtpErrorKind, FtpResult};
