//! Server → client path: intercept the first capability response, then relay raw.
//!
//! The [`Interceptor`] decodes frames from the server until one carries
//! `result.capabilities`, rewrites that frame, and switches to passthrough.
//! From then on bytes are copied without parsing, starting exactly at the end
//! of the rewritten frame's body.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, info, warn};

use crate::codec::{FrameReader, FrameWriter};
use crate::error::{FilterError, Result};
use crate::filter::{filter_capabilities, FilterOutcome, FilterPolicy};
use crate::frame::{Frame, MAX_FRAME_SIZE};

/// Target used to mirror forwarded traffic to the diagnostics sink
pub const MIRROR_TARGET: &str = "a3s_lsp_filter::mirror";

const PASSTHROUGH_CHUNK: usize = 8 * 1024;

/// Whether the pipeline still decodes frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptionState {
    /// Looking for the first capability-bearing response
    Intercepting,
    /// Relaying bytes verbatim until the server closes its output
    Passthrough,
}

/// Summary of one run of the server → client path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Frames decoded and re-emitted before passthrough
    pub frames_forwarded: usize,
    /// A capability response was found and filtered
    pub intercepted: bool,
    /// Interception ended on a framing error
    pub degraded: bool,
    /// Bytes relayed without parsing
    pub passthrough_bytes: u64,
}

/// Drives one server output stream through interception and passthrough.
#[derive(Debug)]
pub struct Interceptor {
    policy: FilterPolicy,
    state: InterceptionState,
    max_frame_size: usize,
}

impl Interceptor {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            policy,
            state: InterceptionState::Intercepting,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Limit the body size accepted while intercepting.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn state(&self) -> InterceptionState {
        self.state
    }

    pub fn policy(&self) -> &FilterPolicy {
        &self.policy
    }

    /// Process one decoded frame, returning the frame to forward.
    ///
    /// Transitions to [`InterceptionState::Passthrough`] when the frame
    /// carries a capability map. Frames that are not JSON or carry no
    /// capabilities are returned with their original bytes.
    pub fn process_frame(&mut self, frame: Frame) -> Result<Frame> {
        let mut message = match frame.to_json() {
            Ok(message) => message,
            Err(e) => {
                debug!("Forwarding non-JSON frame unfiltered: {}", e);
                return Ok(frame);
            }
        };

        match filter_capabilities(&mut message, &self.policy) {
            FilterOutcome::NotApplicable => Ok(frame),
            FilterOutcome::Applied { suppressed } => {
                info!(
                    "Filtered server capabilities ({} mode), disabled: {:?}",
                    self.policy.mode(),
                    suppressed
                );
                self.state = InterceptionState::Passthrough;
                Ok(Frame::from_json(&message)?)
            }
        }
    }

    /// Run until `from_server` closes, writing everything to `to_client`.
    pub async fn run<R, W>(&mut self, from_server: R, to_client: W) -> Result<PipelineReport>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut report = PipelineReport::default();
        let mut reader = FrameReader::with_max_frame_size(from_server, self.max_frame_size);
        let mut writer = FrameWriter::new(to_client);

        while self.state == InterceptionState::Intercepting {
            match reader.read_frame().await {
                Ok(Some(frame)) => {
                    let frame = self.process_frame(frame)?;
                    writer.write_frame(&frame).await?;
                    mirror_frame(&frame);
                    report.frames_forwarded += 1;
                }
                Ok(None) => break,
                Err(FilterError::Framing(e)) => {
                    warn!("Framing error from server, relaying remaining output unfiltered: {}", e);
                    report.degraded = true;
                    self.state = InterceptionState::Passthrough;
                }
                Err(e) => return Err(e),
            }
        }
        report.intercepted = self.state == InterceptionState::Passthrough && !report.degraded;
        self.state = InterceptionState::Passthrough;

        let (mut from_server, pending) = reader.into_parts();
        report.passthrough_bytes = relay_raw(&mut from_server, &mut writer, pending).await?;

        debug!(
            frames = report.frames_forwarded,
            bytes = report.passthrough_bytes,
            "Server output closed"
        );
        Ok(report)
    }
}

/// Copy `pending` and then everything left in `src` to `dst`, unparsed.
async fn relay_raw<R, W>(src: &mut R, dst: &mut FrameWriter<W>, pending: BytesMut) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut total = 0u64;
    if !pending.is_empty() {
        dst.write_raw(&pending).await?;
        mirror_chunk(&pending);
        total += pending.len() as u64;
    }

    let mut buf = vec![0u8; PASSTHROUGH_CHUNK];
    loop {
        let n = src.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }
        dst.write_raw(&buf[..n]).await?;
        mirror_chunk(&buf[..n]);
        total += n as u64;
    }
}

fn mirror_frame(frame: &Frame) {
    info!(
        target: MIRROR_TARGET,
        len = frame.content_length(),
        "-> {}",
        String::from_utf8_lossy(frame.body())
    );
}

fn mirror_chunk(chunk: &[u8]) {
    info!(
        target: MIRROR_TARGET,
        len = chunk.len(),
        "-> {}",
        String::from_utf8_lossy(chunk)
    );
}
