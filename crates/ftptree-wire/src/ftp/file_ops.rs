//! File-level operations: download (RETR), upload (STOR), delete (DELE).
//!
//! A negative reply to the transfer command itself means "the server would
//! not do it" (missing file, no permission) and is reported as `None` /
//! `false`. Transport failures and a failed completion reply are errors.

use crate::ftp::client::FtpClient;
use crate::ftp::error::{FtpError, FtpResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Default chunk size for streaming uploads (64 KiB).
const DEFAULT_CHUNK: usize = 65_536;

impl FtpClient {
    // ─── DOWNLOAD (RETR) ─────────────────────────────────────────

    /// Download `remote_path` into memory. `Ok(None)` when RETR is refused.
    pub async fn retrieve(&mut self, remote_path: &str) -> FtpResult<Option<Vec<u8>>> {
        let result = self.retrieve_inner(remote_path).await;
        self.track(result)
    }

    async fn retrieve_inner(&mut self, remote_path: &str) -> FtpResult<Option<Vec<u8>>> {
        let channel = self.open_data_channel().await?;
        let resp = self.codec.execute(&format!("RETR {}", remote_path)).await?;
        if !resp.is_preliminary() && !resp.is_completion() {
            log::debug!("RETR {} refused: {}", remote_path, resp.text());
            return Ok(None);
        }

        let mut tcp = channel.establish().await?;
        let mut buf = Vec::new();
        tcp.read_to_end(&mut buf).await?;
        drop(tcp);

        if resp.is_preliminary() {
            self.read_completion().await?;
        }

        self.info.bytes_downloaded += buf.len() as u64;
        self.touch();
        Ok(Some(buf))
    }

    // ─── UPLOAD (STOR) ───────────────────────────────────────────

    /// Upload everything `content` yields to `remote_path`.
    /// `Ok(false)` when STOR is refused.
    pub async fn store<R>(&mut self, remote_path: &str, content: &mut R) -> FtpResult<bool>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let result = self.store_inner(remote_path, content).await;
        self.track(result)
    }

    async fn store_inner<R>(&mut self, remote_path: &str, content: &mut R) -> FtpResult<bool>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let channel = self.open_data_channel().await?;
        let resp = self.codec.execute(&format!("STOR {}", remote_path)).await?;
        if !resp.is_preliminary() && !resp.is_completion() {
            log::debug!("STOR {} refused: {}", remote_path, resp.text());
            return Ok(false);
        }

        let mut tcp = channel.establish().await?;
        let mut buf = vec![0u8; DEFAULT_CHUNK];
        let mut written = 0u64;
        loop {
            let n = content.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            tcp.write_all(&buf[..n])
                .await
                .map_err(|e| FtpError::transfer_failed(format!("STOR {}: {}", remote_path, e)))?;
            written += n as u64;
        }
        tcp.flush().await?;
        tcp.shutdown().await?;
        drop(tcp);

        if resp.is_preliminary() {
            self.read_completion().await?;
        }

        self.info.bytes_uploaded += written;
        self.touch();
        Ok(true)
    }

    // ─── DELE ────────────────────────────────────────────────────

    /// Delete a remote file. `Ok(false)` when DELE is refused.
    pub async fn delete(&mut self, remote_path: &str) -> FtpResult<bool> {
        let resp = self.codec.execute(&format!("DELE {}", remote_path)).await;
        let resp = self.track(resp)?;
        self.touch();
        if !resp.is_completion() {
            log::debug!("DELE {} refused: {}", remote_path, resp.text());
            return Ok(false);
        }
        Ok(true)
    }
}
