//! Byte streams handed across the public API.
//!
//! An `InputStream` or `OutputStream` may be *invalid*: there is nothing
//! behind it. `Client::get_file` returns an invalid stream for a remote file
//! that does not exist, so check `is_valid()` before reading.

use crate::codec;
use crate::error::{FtpError, FtpResult};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

// ─── Input ───────────────────────────────────────────────────────────

/// Readable byte stream.
pub struct InputStream {
    reader: Option<BoxedReader>,
}

impl InputStream {
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            reader: Some(Box::new(reader)),
        }
    }

    /// A stream with nothing behind it.
    pub fn invalid() -> Self {
        Self { reader: None }
    }

    pub fn is_valid(&self) -> bool {
        self.reader.is_some()
    }

    fn reader_mut(&mut self) -> FtpResult<&mut BoxedReader> {
        self.reader
            .as_mut()
            .ok_or_else(|| FtpError::invalid_stream("Input stream is not valid"))
    }

    /// Read one byte; `None` at end of stream.
    pub async fn read(&mut self) -> FtpResult<Option<u8>> {
        let reader = self.reader_mut()?;
        let mut byte = [0u8; 1];
        match reader.read(&mut byte).await? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Drain the rest of the stream.
    pub async fn read_bytes(&mut self) -> FtpResult<Vec<u8>> {
        let reader = self.reader_mut()?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Drain the rest of the stream and decode it as UTF-8.
    pub async fn read_text(&mut self) -> FtpResult<String> {
        let bytes = self.read_bytes().await?;
        codec::bytes_to_text(&bytes)
    }

    /// Release the underlying reader. The stream is invalid afterwards.
    pub fn close(&mut self) {
        self.reader = None;
    }

    pub fn into_reader(self) -> Option<BoxedReader> {
        self.reader
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStream")
            .field("valid", &self.is_valid())
            .finish()
    }
}

// ─── Output ──────────────────────────────────────────────────────────

enum Sink {
    Memory(Vec<u8>),
    Writer(BoxedWriter),
}

/// Writable byte stream: either an in-memory buffer or any async writer.
pub struct OutputStream {
    sink: Option<Sink>,
}

impl OutputStream {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            sink: Some(Sink::Writer(Box::new(writer))),
        }
    }

    pub fn memory() -> Self {
        Self {
            sink: Some(Sink::Memory(Vec::new())),
        }
    }

    pub fn invalid() -> Self {
        Self { sink: None }
    }

    pub fn is_valid(&self) -> bool {
        self.sink.is_some()
    }

    pub async fn write(&mut self, byte: u8) -> FtpResult<()> {
        self.write_bytes(&[byte]).await
    }

    pub async fn write_bytes(&mut self, data: &[u8]) -> FtpResult<()> {
        match self.sink.as_mut() {
            Some(Sink::Memory(buf)) => buf.extend_from_slice(data),
            Some(Sink::Writer(w)) => w.write_all(data).await?,
            None => return Err(FtpError::invalid_stream("Output stream is not valid")),
        }
        Ok(())
    }

    pub async fn write_text(&mut self, text: &str) -> FtpResult<()> {
        self.write_bytes(&codec::text_to_bytes(text)).await
    }

    /// Flush and shut down a writer-backed stream, which becomes invalid.
    /// Closing an in-memory stream keeps its bytes readable.
    pub async fn close(&mut self) -> FtpResult<()> {
        match self.sink.take() {
            Some(Sink::Writer(mut w)) => {
                w.flush().await?;
                w.shutdown().await?;
            }
            other => self.sink = other,
        }
        Ok(())
    }

    /// Bytes accumulated so far. Only in-memory streams accumulate.
    pub fn get_bytes(&self) -> FtpResult<Vec<u8>> {
        match &self.sink {
            Some(Sink::Memory(buf)) => Ok(buf.clone()),
            Some(Sink::Writer(_)) => Err(FtpError::invalid_stream(
                "Only in-memory output streams accumulate bytes",
            )),
            None => Err(FtpError::invalid_stream("Output stream is not valid")),
        }
    }

    pub fn get_text(&self) -> FtpResult<String> {
        codec::bytes_to_text(&self.get_bytes()?)
    }
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.sink {
            Some(Sink::Memory(_)) => "memory",
            Some(Sink::Writer(_)) => "writer",
            None => "invalid",
        };
        f.debug_struct("OutputStream").field("sink", &kind).finish()
    }
}

// ─── Factories ───────────────────────────────────────────────────────

pub fn create_byte_array_input_stream(data: impl Into<Vec<u8>>) -> InputStream {
    InputStream::new(Cursor::new(data.into()))
}

pub fn create_byte_array_output_stream() -> OutputStream {
    OutputStream::memory()
}

pub fn create_input_stream<R>(reader: R) -> InputStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    InputStream::new(reader)
}

pub fn create_output_stream<W>(writer: W) -> OutputStream
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    OutputStream::new(writer)
}

/// Open a local file for reading.
pub async fn open_file_input_stream(path: impl AsRef<Path>) -> FtpResult<InputStream> {
    let file = tokio::fs::File::open(path.as_ref()).await?;
    Ok(InputStream::new(file))
}

/// Pump `input` into `output` until the input is exhausted.
pub async fn copy(input: &mut InputStream, output: &mut OutputStream) -> FtpResult<u64> {
    let reader = input.reader_mut()?;
    let copied = match output.sink.as_mut() {
        Some(Sink::Memory(buf)) => tokio::io::copy(reader, buf).await?,
        Some(Sink::Writer(w)) => tokio::io::copy(reader, w).await?,
        None => return Err(FtpError::invalid_stream("Output stream is not valid")),
    };
    Ok(copied)
}
