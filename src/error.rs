//! Error types for a3s-lsp-filter

use thiserror::Error;

/// Framing failures while delimiting `Content-Length` messages.
///
/// Any of these ends the interception phase; the pipeline then relays the
/// remaining bytes without parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Header block terminated without a `Content-Length` header
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// `Content-Length` value is not a non-negative decimal integer
    #[error("invalid Content-Length value: '{0}'")]
    InvalidContentLength(String),

    /// More than one `Content-Length` header in a single block
    #[error("duplicate Content-Length header")]
    DuplicateContentLength,

    /// Header line that is not `name: value`
    #[error("malformed header line: '{0}'")]
    MalformedHeader(String),

    /// No header terminator within the header size limit
    #[error("header block exceeds {limit} bytes without terminator")]
    HeaderTooLarge { limit: usize },

    /// Declared body length above the configured maximum
    #[error("frame too large: {len} bytes (max {limit})")]
    FrameTooLarge { len: usize, limit: usize },

    /// Stream closed before the declared body was complete
    #[error("stream closed mid-body: expected {expected} bytes, got {received}")]
    Truncated { expected: usize, received: usize },
}

/// Errors that can occur while proxying a language server
#[derive(Debug, Error)]
pub enum FilterError {
    /// Framing failure on the server's output
    #[error("framing error: {0}")]
    Framing(#[from] FrameError),

    /// Stream read/write failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON re-encoding failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Child process could not be launched or awaited
    #[error("process error for '{binary}': {msg}")]
    Process { binary: String, msg: String },
}

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, FilterError>;
