//! Data-channel management for FTP transfers.
//!
//! Supports four modes (RFC 959 + RFC 2428):
//! - **PASV**: server opens a port, client connects
//! - **EPSV**: extended passive (IPv6-ready)
//! - **PORT**: client opens a port, tells server
//! - **EPRT**: extended active (IPv6-ready)
//!
//! Passive modes hand back a connected socket straight away. Active modes
//! can only accept once the server starts the transfer, so they hand back
//! a pending listener that the caller resolves after issuing RETR/STOR/LIST.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::types::DataChannelMode;
use lazy_static::lazy_static;
use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};

lazy_static! {
    static ref PASV_RE: Regex =
        Regex::new(r"\((\d+),(\d+),(\d+),(\d+),(\d+),(\d+)\)").expect("static PASV pattern");
    static ref EPSV_RE: Regex = Regex::new(r"\|\|\|(\d+)\|").expect("static EPSV pattern");
}

/// A data channel that is either already connected or waiting for the
/// server to connect back.
pub enum DataChannel {
    Connected(TcpStream),
    Pending {
        listener: TcpListener,
        data_timeout: Duration,
    },
}

impl DataChannel {
    /// Resolve into a connected socket. Must be called after the transfer
    /// command has been accepted by the server.
    pub async fn establish(self) -> FtpResult<TcpStream> {
        match self {
            DataChannel::Connected(tcp) => Ok(tcp),
            DataChannel::Pending {
                listener,
                data_timeout,
            } => {
                let (tcp, _) = timeout(data_timeout, listener.accept())
                    .await
                    .map_err(|_| FtpError::data_channel("Active-mode accept timed out"))?
                    .map_err(|e| FtpError::data_channel(format!("Active-mode accept: {}", e)))?;
                Ok(tcp)
            }
        }
    }
}

/// Open a data channel according to the configured mode.
pub async fn open_data_channel(
    codec: &mut FtpCodec,
    mode: DataChannelMode,
    host: &str,
    data_timeout: Duration,
    active_bind: Option<&str>,
) -> FtpResult<DataChannel> {
    match mode {
        DataChannelMode::Passive => Ok(DataChannel::Connected(
            open_pasv(codec, data_timeout).await?,
        )),
        DataChannelMode::ExtendedPassive => Ok(DataChannel::Connected(
            open_epsv(codec, host, data_timeout).await?,
        )),
        DataChannelMode::Active => open_port(codec, active_bind, data_timeout).await,
        DataChannelMode::ExtendedActive => open_eprt(codec, active_bind, data_timeout).await,
    }
}

// ─── PASV ────────────────────────────────────────────────────────────

/// Issue `PASV`, parse the response, connect to the returned address.
///
/// Response format: `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
async fn open_pasv(codec: &mut FtpCodec, data_timeout: Duration) -> FtpResult<TcpStream> {
    let resp = codec.expect_ok("PASV").await?;
    let addr = parse_pasv_response(&resp.text())?;
    let tcp = timeout(data_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| FtpError::data_channel("PASV data connect timed out"))?
        .map_err(|e| FtpError::data_channel(format!("PASV data connect: {}", e)))?;
    Ok(tcp)
}

/// Parse `(h1,h2,h3,h4,p1,p2)` from a 227 response.
pub fn parse_pasv_response(text: &str) -> FtpResult<SocketAddr> {
    let caps = PASV_RE
        .captures(text)
        .ok_or_else(|| FtpError::protocol_error(format!("Cannot parse PASV: {}", text)))?;

    let nums: Vec<u8> = (1..=6)
        .map(|i| {
            caps[i]
                .parse::<u8>()
                .map_err(|_| FtpError::protocol_error("PASV number out of range"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ip = IpAddr::from([nums[0], nums[1], nums[2], nums[3]]);
    let port = (nums[4] as u16) * 256 + (nums[5] as u16);
    Ok(SocketAddr::new(ip, port))
}

// ─── EPSV ────────────────────────────────────────────────────────────

/// Issue `EPSV`, parse port, connect to the *same host* on that port.
///
/// Response format: `229 Entering Extended Passive Mode (|||port|)`
async fn open_epsv(
    codec: &mut FtpCodec,
    host: &str,
    data_timeout: Duration,
) -> FtpResult<TcpStream> {
    let resp = codec.expect_ok("EPSV").await?;
    let port = parse_epsv_response(&resp.text())?;
    let addr = format!("{}:{}", host, port);
    let tcp = timeout(data_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| FtpError::data_channel("EPSV data connect timed out"))?
        .map_err(|e| FtpError::data_channel(format!("EPSV data connect: {}", e)))?;
    Ok(tcp)
}

pub fn parse_epsv_response(text: &str) -> FtpResult<u16> {
    let caps = EPSV_RE
        .captures(text)
        .ok_or_else(|| FtpError::protocol_error(format!("Cannot parse EPSV: {}", text)))?;
    caps[1]
        .parse::<u16>()
        .map_err(|_| FtpError::protocol_error("EPSV port out of range"))
}

// ─── PORT ────────────────────────────────────────────────────────────

/// Bind a local TCP listener and announce it via `PORT`.
async fn open_port(
    codec: &mut FtpCodec,
    bind_addr: Option<&str>,
    data_timeout: Duration,
) -> FtpResult<DataChannel> {
    let listener = bind_listener(bind_addr, "PORT").await?;
    let local = listener
        .local_addr()
        .map_err(|e| FtpError::data_channel(format!("PORT local_addr: {}", e)))?;

    let ip = match local.ip() {
        IpAddr::V4(v4) => v4,
        _ => return Err(FtpError::data_channel("PORT requires IPv4")),
    };
    codec.expect_ok(&format_port_command(ip.octets(), local.port())).await?;

    Ok(DataChannel::Pending {
        listener,
        data_timeout,
    })
}

fn format_port_command(octets: [u8; 4], port: u16) -> String {
    format!(
        "PORT {},{},{},{},{},{}",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}

// ─── EPRT ────────────────────────────────────────────────────────────

/// Bind a local listener and announce it via `EPRT`.
///
/// Command format: `EPRT |1|ip|port|` (1 = IPv4, 2 = IPv6)
async fn open_eprt(
    codec: &mut FtpCodec,
    bind_addr: Option<&str>,
    data_timeout: Duration,
) -> FtpResult<DataChannel> {
    let listener = bind_listener(bind_addr, "EPRT").await?;
    let local = listener
        .local_addr()
        .map_err(|e| FtpError::data_channel(format!("EPRT local_addr: {}", e)))?;

    let af = match local.ip() {
        IpAddr::V4(_) => 1,
        IpAddr::V6(_) => 2,
    };
    let cmd = format!("EPRT |{}|{}|{}|", af, local.ip(), local.port());
    codec.expect_ok(&cmd).await?;

    Ok(DataChannel::Pending {
        listener,
        data_timeout,
    })
}

async fn bind_listener(bind_addr: Option<&str>, mode: &str) -> FtpResult<TcpListener> {
    let bind = bind_addr.unwrap_or("0.0.0.0");
    TcpListener::bind(format!("{}:0", bind))
        .await
        .map_err(|e| FtpError::data_channel(format!("{} bind: {}", mode, e)))
}
