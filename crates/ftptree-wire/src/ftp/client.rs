//! Stateful FTP client. Owns the control connection and issues commands.
//!
//! Lifecycle: `connect()` → banner → USER/PASS → FEAT/SYST/PWD probing →
//! set TYPE. Transfers (`file_ops.rs`) and listings open one data channel
//! per command.

use crate::ftp::connection;
use crate::ftp::error::{FtpError, FtpErrorKind, FtpResult};
use crate::ftp::parser;
use crate::ftp::protocol::FtpCodec;
use crate::ftp::transfer::{self, DataChannel};
use crate::ftp::types::*;
use chrono::Utc;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

/// A connected FTP client session.
pub struct FtpClient {
    pub id: String,
    pub(crate) codec: FtpCodec,
    pub config: FtpConnectionConfig,
    pub info: FtpSessionInfo,
    pub features: ServerFeatures,
}

impl FtpClient {
    /// Establish and authenticate a new FTP session.
    pub async fn connect(config: FtpConnectionConfig) -> FtpResult<Self> {
        if config.host.is_empty() {
            return Err(FtpError::invalid_config("Host must not be empty"));
        }

        let session_id = Uuid::new_v4().to_string();
        let (mut codec, banner) = connection::connect(&config).await?;

        // ── Authenticate ─────────────────────────────────────────
        let user_resp = codec.execute(&format!("USER {}", config.username)).await?;
        if user_resp.code == 331 {
            let pass_resp = codec
                .execute(&format!("PASS {}", config.password.expose_secret()))
                .await?;
            if !pass_resp.is_completion() {
                return Err(FtpError::auth_failed(format!(
                    "Login failed: {}",
                    pass_resp.text()
                ))
                .with_code(pass_resp.code));
            }
        } else if !user_resp.is_completion() {
            return Err(FtpError::auth_failed(format!(
                "USER rejected: {}",
                user_resp.text()
            ))
            .with_code(user_resp.code));
        }

        // ── FEAT ─────────────────────────────────────────────────
        let features = Self::probe_features(&mut codec).await;

        if config.utf8 && features.utf8 {
            let _ = codec.execute("OPTS UTF8 ON").await;
        }

        // ── SYST ─────────────────────────────────────────────────
        let system_type = match codec.execute("SYST").await {
            Ok(r) if r.is_completion() => Some(r.text().trim_start_matches("215 ").to_string()),
            _ => None,
        };

        // ── PWD / TYPE ───────────────────────────────────────────
        let cwd = Self::get_pwd(&mut codec).await.unwrap_or_else(|_| "/".into());
        codec.expect_ok(config.transfer_type.command()).await?;

        let now = Utc::now();
        let info = FtpSessionInfo {
            id: session_id.clone(),
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            connected: true,
            current_directory: cwd,
            server_banner: Some(banner.text()),
            system_type,
            features: features.raw_features.clone(),
            connected_at: now,
            last_activity: now,
            transfer_type: config.transfer_type,
            label: config.label.clone(),
            bytes_uploaded: 0,
            bytes_downloaded: 0,
        };

        log::info!(
            "FTP session {} logged in to {} as {}",
            session_id,
            config.address(),
            config.username
        );

        Ok(Self {
            id: session_id,
            codec,
            config,
            info,
            features,
        })
    }

    // ─── PWD / CWD ───────────────────────────────────────────────

    async fn get_pwd(codec: &mut FtpCodec) -> FtpResult<String> {
        let resp = codec.expect_ok("PWD").await?;
        parse_pwd(&resp.text())
    }

    /// Ask the server for its working directory.
    pub async fn pwd(&mut self) -> FtpResult<String> {
        let dir = Self::get_pwd(&mut self.codec).await;
        let dir = self.track(dir)?;
        self.info.current_directory = dir.clone();
        self.touch();
        Ok(dir)
    }

    /// Try to enter `path`. A refused CWD is `Ok(false)`, not an error.
    pub async fn change_dir(&mut self, path: &str) -> FtpResult<bool> {
        let resp = self.codec.execute(&format!("CWD {}", path)).await;
        let resp = self.track(resp)?;
        self.touch();
        if !resp.is_completion() {
            log::debug!("CWD {} refused: {}", path, resp.text());
            return Ok(false);
        }
        self.info.current_directory = path.to_string();
        Ok(true)
    }

    // ─── FEAT probe ──────────────────────────────────────────────

    async fn probe_features(codec: &mut FtpCodec) -> ServerFeatures {
        let resp = match codec.execute("FEAT").await {
            Ok(r) if r.is_completion() => r,
            _ => return ServerFeatures::default(),
        };

        let raw: Vec<String> = resp
            .lines
            .iter()
            .skip(1)
            .filter(|l| !l.starts_with("211"))
            .map(|l| l.trim().to_uppercase())
            .collect();

        let has = |feat: &str| raw.iter().any(|l| l.starts_with(feat));

        ServerFeatures {
            mlsd: has("MLSD"),
            size: has("SIZE"),
            utf8: has("UTF8"),
            epsv: has("EPSV"),
            eprt: has("EPRT"),
            raw_features: raw,
        }
    }

    // ─── Data channel helper ─────────────────────────────────────

    pub(crate) async fn open_data_channel(&mut self) -> FtpResult<DataChannel> {
        transfer::open_data_channel(
            &mut self.codec,
            self.config.data_channel_mode,
            &self.config.host,
            Duration::from_secs(self.config.data_timeout_sec),
            self.config.active_bind_address.as_deref(),
        )
        .await
    }

    // ─── Listing ─────────────────────────────────────────────────

    /// List the working directory (MLSD when advertised and preferred).
    pub async fn list(&mut self) -> FtpResult<Vec<FtpEntry>> {
        let cmd = if self.config.prefer_mlsd && self.features.mlsd {
            "MLSD"
        } else {
            "LIST"
        };
        let data = self.retrieve_data_as_string(cmd).await;
        let data = self.track(data)?;
        self.touch();
        Ok(parser::parse_listing(&data))
    }

    /// Open a data channel, send `cmd`, collect the body as a String.
    async fn retrieve_data_as_string(&mut self, cmd: &str) -> FtpResult<String> {
        let channel = self.open_data_channel().await?;
        let resp = self.codec.execute(cmd).await?;
        if !resp.is_preliminary() && !resp.is_completion() {
            return Err(FtpError::from_reply(resp.code, &resp.text()));
        }

        let mut tcp = channel.establish().await?;
        let mut buf = Vec::new();
        tcp.read_to_end(&mut buf).await?;
        drop(tcp);

        if resp.is_preliminary() {
            self.read_completion().await?;
        }

        String::from_utf8(buf)
            .map_err(|e| FtpError::protocol_error(format!("{} data not UTF-8: {}", cmd, e)))
    }

    /// Read the 226 that closes a transfer.
    pub(crate) async fn read_completion(&mut self) -> FtpResult<()> {
        let done = self.codec.read_response().await?;
        if !done.is_completion() {
            return Err(FtpError::from_reply(done.code, &done.text()));
        }
        Ok(())
    }

    // ─── QUIT ────────────────────────────────────────────────────

    /// Gracefully close the session. Errors from QUIT itself are ignored.
    pub async fn quit(&mut self) -> FtpResult<()> {
        if !self.info.connected {
            return Ok(());
        }
        let _ = self.codec.execute("QUIT").await;
        let _ = self.codec.shutdown().await;
        self.info.connected = false;
        log::info!("FTP session {} closed", self.id);
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.info.last_activity = Utc::now();
    }

    pub fn is_connected(&self) -> bool {
        self.info.connected
    }

    /// Pass a result through, marking the session dead when the error
    /// means the control connection is gone.
    pub(crate) fn track<T>(&mut self, result: FtpResult<T>) -> FtpResult<T> {
        if let Err(ref err) = result {
            if matches!(
                err.kind,
                FtpErrorKind::Disconnected | FtpErrorKind::IoError | FtpErrorKind::Timeout
            ) {
                self.info.connected = false;
            }
        }
        result.map_err(|e| e.with_session(self.id.clone()))
    }

    pub fn session_info(&self) -> &FtpSessionInfo {
        &self.info
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Parse `257 "/some/path"` into the path string. Doubled quotes inside
/// the path are unescaped (RFC 959 Appendix II).
pub fn parse_pwd(text: &str) -> FtpResult<String> {
    let start = text
        .find('"')
        .ok_or_else(|| FtpError::protocol_error(format!("Cannot parse PWD: {}", text)))?;
    let mut out = String::new();
    let mut chars = text[start + 1..].chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                out.push('"');
                continue;
            }
            return Ok(out);
        }
        out.push(c);
    }
    Err(FtpError::protocol_error(format!("Cannot parse PWD: {}", text)))
}
