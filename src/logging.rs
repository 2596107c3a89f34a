//! Diagnostics sink
//!
//! stdout carries the protocol, so all logging (including the traffic
//! mirror) goes to stderr. Events are handed to a writer thread through a
//! bounded queue; when stderr is not drained and the queue is full, new
//! lines are dropped and the relays keep running.

use std::io::Write;

use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;

/// Log lines queued for the writer thread before new ones are dropped
pub const BUFFERED_LINES: usize = 128_000;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Wrap `sink` in a lossy non-blocking writer.
///
/// The returned guard flushes queued lines when dropped.
pub fn non_blocking<W>(sink: W, buffered_lines: usize) -> (NonBlocking, WorkerGuard)
where
    W: Write + Send + 'static,
{
    NonBlockingBuilder::default()
        .lossy(true)
        .buffered_lines_limit(buffered_lines)
        .finish(sink)
}

/// Filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber writing to stderr.
///
/// Keep the guard alive until the process exits.
pub fn init() -> WorkerGuard {
    let (writer, guard) = non_blocking(std::io::stderr(), BUFFERED_LINES);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}
