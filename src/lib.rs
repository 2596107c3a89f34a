//! # a3s-lsp-filter
//!
//! Transparent proxy between an editor and a language server that hides
//! selected server capabilities.
//!
//! ## Overview
//!
//! The proxy launches the language server, relays the editor's input to it
//! unmodified, and watches the server's output for the first response
//! carrying `result.capabilities` (the `initialize` response). Provider keys
//! in that map (`hoverProvider`, `completionProvider`, ...) are forced to
//! `false` according to a [`FilterPolicy`], the message is re-framed with a
//! correct `Content-Length`, and from then on the server's output is copied
//! byte for byte without further parsing.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_lsp_filter::{filter_capabilities, FilterPolicy, Mode};
//!
//! let policy = FilterPolicy::new(Mode::Enable, ["completion"]);
//! let mut message = serde_json::json!({
//!     "jsonrpc": "2.0",
//!     "id": 0,
//!     "result": { "capabilities": { "completionProvider": true, "hoverProvider": true } }
//! });
//!
//! assert!(filter_capabilities(&mut message, &policy).is_applied());
//! assert_eq!(message["result"]["capabilities"]["hoverProvider"], false);
//! ```
//!
//! ## Architecture
//!
//! - **frame** / **codec** — `Content-Length` framing over chunked byte streams
//! - **filter** — pure capability rewrite
//! - **pipeline** — one-shot interception, then raw passthrough
//! - **session** — server process and the stdio relays around it
//! - **logging** — non-blocking stderr diagnostics

pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod frame;
pub mod logging;
pub mod pipeline;
pub mod session;

// Re-export core types
pub use codec::{FrameReader, FrameWriter};
pub use config::{Cli, Config};
pub use error::{FilterError, FrameError, Result};
pub use filter::{filter_capabilities, FilterOutcome, FilterPolicy, Mode};
pub use frame::{Frame, FrameHeader};
pub use pipeline::{InterceptionState, Interceptor, PipelineReport};
pub use session::{Session, SessionReport};
