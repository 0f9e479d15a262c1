//! Shared types for the FTP engine.

use crate::ftp::error::FtpResult;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Connection / Session ────────────────────────────────────────────

/// Transfer type (RFC 959 TYPE command).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransferType {
    Ascii,
    #[default]
    Binary,
}

impl TransferType {
    pub fn command(self) -> &'static str {
        match self {
            TransferType::Ascii => "TYPE A",
            TransferType::Binary => "TYPE I",
        }
    }
}

/// Transfer mode selected for the data channel.
/// `Passive` suits clients behind NAT; the active modes need the server to
/// reach back to `active_bind_address`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DataChannelMode {
    #[default]
    Passive,
    ExtendedPassive,
    Active,
    ExtendedActive,
}

/// Configuration for a single FTP connection.
///
/// The password is never serialized and is redacted in `Debug` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password", skip_serializing)]
    pub password: SecretString,
    #[serde(default)]
    pub transfer_type: TransferType,
    #[serde(default)]
    pub data_channel_mode: DataChannelMode,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// Data-channel timeout in seconds.
    #[serde(default = "default_data_timeout")]
    pub data_timeout_sec: u64,
    /// UTF-8 encoding (OPTS UTF8 ON).
    #[serde(default = "default_true")]
    pub utf8: bool,
    /// Prefer MLSD over LIST when the server advertises it.
    #[serde(default = "default_true")]
    pub prefer_mlsd: bool,
    /// Local address to bind for active-mode data connections.
    #[serde(default)]
    pub active_bind_address: Option<String>,
    /// Friendly label used in log lines.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_port() -> u16 {
    21
}
fn default_username() -> String {
    "anonymous".into()
}
fn default_password() -> SecretString {
    SecretString::new("anonymous@".into())
}
fn default_connect_timeout() -> u64 {
    15
}
fn default_data_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for FtpConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: default_username(),
            password: default_password(),
            transfer_type: TransferType::Binary,
            data_channel_mode: DataChannelMode::Passive,
            connect_timeout_sec: default_connect_timeout(),
            data_timeout_sec: default_data_timeout(),
            utf8: true,
            prefer_mlsd: true,
            active_bind_address: None,
            label: None,
        }
    }
}

impl FtpConnectionConfig {
    /// Credentials plus defaults for everything else.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: SecretString::new(password.into()),
            ..Self::default()
        }
    }

    /// Parse a camelCase JSON document, e.g. `{"host": "ftp.example.org", "password": "..."}`.
    pub fn from_json(json: &str) -> FtpResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// `host:port` as used for the control connection.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Information about an active FTP session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpSessionInfo {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub connected: bool,
    pub current_directory: String,
    pub server_banner: Option<String>,
    pub system_type: Option<String>,
    pub features: Vec<String>,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub transfer_type: TransferType,
    pub label: Option<String>,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
}

// ─── Directory Listing ───────────────────────────────────────────────

/// Type of a remote filesystem entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FtpEntryKind {
    File,
    Directory,
    Symlink,
    Unknown,
}

/// One entry from a directory listing (parsed from LIST or MLSD output).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpEntry {
    pub name: String,
    pub kind: FtpEntryKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub permissions: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub link_target: Option<String>,
    /// Raw line from the server (for debugging).
    pub raw: Option<String>,
    /// MLSD fact map (e.g. "type" → "file", "size" → "1234").
    #[serde(default)]
    pub facts: HashMap<String, String>,
}

impl FtpEntry {
    /// A bare record with only a name and a kind.
    pub fn new(name: impl Into<String>, kind: FtpEntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: 0,
            modified: None,
            permissions: None,
            owner: None,
            group: None,
            link_target: None,
            raw: None,
            facts: HashMap::new(),
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn is_file(&self) -> bool {
        self.kind == FtpEntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == FtpEntryKind::Directory
    }
}

// ─── FTP Response ────────────────────────────────────────────────────

/// A single FTP response (may be multi-line).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Full response text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the response code indicates success (1xx–3xx).
    pub fn is_success(&self) -> bool {
        self.code < 400
    }

    /// Whether this is a positive-preliminary reply (1xx).
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Whether this is a positive-completion reply (2xx).
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

// ─── Server Capabilities ─────────────────────────────────────────────

/// Parsed FEAT response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerFeatures {
    pub mlsd: bool,
    pub size: bool,
    pub utf8: bool,
    pub epsv: bool,
    pub eprt: bool,
    pub raw_features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg = FtpConnectionConfig::from_json(r#"{"host":"ftp.example.org"}"#).unwrap();
        assert_eq!(cfg.port, 21);
        assert_eq!(cfg.username, "anonymous");
        assert_eq!(cfg.password.expose_secret(), "anonymous@");
        assert_eq!(cfg.data_channel_mode, DataChannelMode::Passive);
        assert!(cfg.prefer_mlsd);
        assert_eq!(cfg.address(), "ftp.example.org:21");
    }

    #[test]
    fn password_is_never_serialized_or_printed() {
        let cfg = FtpConnectionConfig::new("h", 2121, "bob", "hunter2");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"username\":\"bob\""));
        assert!(!format!("{:?}", cfg).contains("hunter2"));
    }

    #[test]
    fn response_classes() {
        let r = FtpResponse { code: 150, lines: vec!["150 Opening".into()] };
        assert!(r.is_preliminary() && r.is_success());
        let r = FtpResponse { code: 550, lines: vec!["550 Nope".into()] };
        assert!(!r.is_success());
    }
}
