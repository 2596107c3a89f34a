//! Wire frame format: `Content-Length: <N>\r\n\r\n<N bytes of JSON>`
//!
//! Extra headers (e.g. `Content-Type`) are tolerated and dropped; only
//! `Content-Length` is emitted when a frame is re-encoded.

use bytes::Bytes;
use serde_json::Value;

use crate::error::FrameError;

/// Name of the only header the framing relies on
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Empty line closing a header block
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Default maximum body size: 16 MiB
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Maximum header block size before the terminator must appear
pub const MAX_HEADER_SIZE: usize = 8 * 1024;

/// One complete message body, exactly as long as its declared `Content-Length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    body: Bytes,
}

impl Frame {
    /// Wrap a message body.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// Serialize a JSON message into a frame body.
    pub fn from_json(message: &Value) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_vec(message)?))
    }

    /// Parse the body as an untyped JSON message.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Declared byte length of the body.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Encode this frame into bytes for the wire.
    pub fn encode(&self) -> Vec<u8> {
        let header = format!("{}: {}\r\n\r\n", CONTENT_LENGTH, self.body.len());
        let mut buf = Vec::with_capacity(header.len() + self.body.len());
        buf.extend_from_slice(header.as_bytes());
        buf.extend_from_slice(&self.body);
        buf
    }

    /// Decode a frame from the front of `buf`.
    /// Returns the frame and the number of bytes consumed, or None if incomplete.
    pub fn decode(buf: &[u8], max_frame_size: usize) -> Result<Option<(Self, usize)>, FrameError> {
        let Some(header) = FrameHeader::parse(buf, max_frame_size)? else {
            return Ok(None);
        };
        let total = header.frame_len();
        if buf.len() < total {
            return Ok(None);
        }
        let body = Bytes::copy_from_slice(&buf[header.header_len..total]);
        Ok(Some((Self { body }, total)))
    }
}

/// A parsed header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Bytes occupied by the header block, terminator included
    pub header_len: usize,
    /// Declared body length
    pub content_length: usize,
}

impl FrameHeader {
    /// Parse the header block at the front of `buf`.
    /// Returns None until the terminator has arrived.
    pub fn parse(buf: &[u8], max_frame_size: usize) -> Result<Option<Self>, FrameError> {
        let Some(header_end) = find_terminator(buf) else {
            if buf.len() >= MAX_HEADER_SIZE + HEADER_TERMINATOR.len() {
                return Err(FrameError::HeaderTooLarge {
                    limit: MAX_HEADER_SIZE,
                });
            }
            return Ok(None);
        };

        let content_length = parse_content_length(&buf[..header_end])?;
        if content_length > max_frame_size {
            return Err(FrameError::FrameTooLarge {
                len: content_length,
                limit: max_frame_size,
            });
        }

        Ok(Some(Self {
            header_len: header_end + HEADER_TERMINATOR.len(),
            content_length,
        }))
    }

    /// Total bytes of header plus body.
    pub fn frame_len(&self) -> usize {
        self.header_len + self.content_length
    }
}

/// Position of the first `\r\n\r\n`, searched only within the header limit.
fn find_terminator(buf: &[u8]) -> Option<usize> {
    let window = &buf[..buf.len().min(MAX_HEADER_SIZE + HEADER_TERMINATOR.len())];
    window
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// Extract the body length from a header block (terminator excluded).
///
/// Header names compare ASCII-case-insensitively, as LSP servers disagree on
/// capitalisation in practice.
fn parse_content_length(block: &[u8]) -> Result<usize, FrameError> {
    let mut content_length = None;

    for raw in block.split(|&b| b == b'\n') {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            continue;
        }
        let line = std::str::from_utf8(raw)
            .map_err(|_| FrameError::MalformedHeader(String::from_utf8_lossy(raw).into_owned()))?;
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;

        if !name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            continue;
        }
        if content_length.is_some() {
            return Err(FrameError::DuplicateContentLength);
        }

        let value = value.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FrameError::InvalidContentLength(value.to_string()));
        }
        let len = value
            .parse::<usize>()
            .map_err(|_| FrameError::InvalidContentLength(value.to_string()))?;
        content_length = Some(len);
    }

    content_length.ok_or(FrameError::MissingContentLength)
}
