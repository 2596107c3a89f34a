//! Async frame reader/writer for any `AsyncRead`/`AsyncWrite` stream.
//!
//! Wraps the [`Frame`] wire format with buffered async I/O. The reader hands
//! its unconsumed buffer back through [`FrameReader::into_parts`] so a caller
//! can stop decoding at an exact frame boundary and relay the rest raw.

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameHeader, MAX_FRAME_SIZE};

const INITIAL_BUF_CAPACITY: usize = 8 * 1024;

/// Async frame reader over any `AsyncRead` stream.
///
/// Buffers incoming bytes and yields complete [`Frame`]s, regardless of how
/// the stream chunks them.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
    max_frame_size: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self::with_max_frame_size(inner, MAX_FRAME_SIZE)
    }

    /// Wrap a reader, rejecting bodies larger than `max_frame_size`.
    pub fn with_max_frame_size(inner: R, max_frame_size: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUF_CAPACITY),
            max_frame_size,
        }
    }

    /// Read the next frame. Returns `None` on clean EOF.
    ///
    /// EOF inside an unterminated header block is also treated as clean; the
    /// partial bytes stay in the buffer. EOF inside a body is a
    /// [`FrameError::Truncated`] error.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some((frame, consumed)) = Frame::decode(&self.buf, self.max_frame_size)? {
                self.buf.advance(consumed);
                return Ok(Some(frame));
            }

            self.buf.reserve(INITIAL_BUF_CAPACITY);
            let n = self.inner.read_buf(&mut self.buf).await?;

            if n == 0 {
                // decode() above already rejected a malformed header
                return match FrameHeader::parse(&self.buf, self.max_frame_size) {
                    Ok(Some(header)) => Err(FrameError::Truncated {
                        expected: header.content_length,
                        received: self.buf.len() - header.header_len,
                    }
                    .into()),
                    _ => Ok(None),
                };
            }
        }
    }

    /// Bytes read from the stream but not yet returned as a frame.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Get a reference to the inner reader.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Consume the reader, returning the stream and any buffered bytes.
    pub fn into_parts(self) -> (R, BytesMut) {
        (self.inner, self.buf)
    }
}

/// Async frame writer over any `AsyncWrite` stream.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write a frame to the stream, re-framed with a fresh `Content-Length`.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.inner.write_all(&frame.encode()).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Write a JSON message as a frame.
    pub async fn write_json(&mut self, message: &serde_json::Value) -> Result<()> {
        self.write_frame(&Frame::from_json(message)?).await
    }

    /// Write bytes verbatim, without framing.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Get a reference to the inner writer.
    pub fn inner(&self) -> &W {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
