//! Text ↔ byte conversion. The encoding is fixed to UTF-8.

use crate::error::{FtpError, FtpResult};

pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Strict decode; invalid UTF-8 is an `Encoding` error.
pub fn bytes_to_text(bytes: &[u8]) -> FtpResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| FtpError::encoding(format!("Content is not valid UTF-8: {}", e)))
}

/// Decode, replacing invalid sequences with U+FFFD.
pub fn bytes_to_text_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
