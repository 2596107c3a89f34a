//! Language server process and the relays around it
//!
//! A session launches the server with piped stdio and runs three relays
//! until the server exits:
//! - client input → server stdin, verbatim
//! - server stdout → [`Interceptor`] → client output
//! - server stderr → our stderr, verbatim

use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{FilterError, Result};
use crate::pipeline::{Interceptor, PipelineReport};

/// Outcome of a finished session
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Exit code to report for the proxy process
    pub exit_code: i32,
    /// Server → client path summary, if that relay finished cleanly
    pub pipeline: Option<PipelineReport>,
}

/// One proxied language server
#[derive(Debug)]
pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run against the process's own stdin/stdout.
    pub async fn run(self) -> Result<SessionReport> {
        self.run_with(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Run with explicit client streams; server stderr goes to our stderr.
    pub async fn run_with<I, O>(self, from_client: I, to_client: O) -> Result<SessionReport>
    where
        I: AsyncRead + Unpin + Send + 'static,
        O: AsyncWrite + Unpin + Send + 'static,
    {
        self.run_with_stderr(from_client, to_client, tokio::io::stderr()).await
    }

    /// Run with explicit client streams and server stderr sink.
    pub async fn run_with_stderr<I, O, E>(
        self,
        from_client: I,
        to_client: O,
        server_stderr: E,
    ) -> Result<SessionReport>
    where
        I: AsyncRead + Unpin + Send + 'static,
        O: AsyncWrite + Unpin + Send + 'static,
        E: AsyncWrite + Unpin + Send + 'static,
    {
        let Config {
            binary,
            args,
            policy,
            providers,
            max_frame_size,
        } = self.config;

        info!(
            "Running binary {} {:?} in mode {} {:?}",
            binary,
            args,
            policy.mode(),
            providers
        );

        let mut child = spawn_server(&binary, &args)?;
        let pipes = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        let (stdin, stdout, stderr) = match pipes {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            _ => {
                return Err(FilterError::Process {
                    binary,
                    msg: "stdio not captured".to_string(),
                })
            }
        };

        let input = tokio::spawn(relay_input(from_client, stdin));
        let diagnostics = tokio::spawn(relay_stderr(stderr, server_stderr));
        let output: JoinHandle<Result<PipelineReport>> = tokio::spawn(async move {
            let mut interceptor = Interceptor::new(policy).with_max_frame_size(max_frame_size);
            interceptor.run(stdout, to_client).await
        });

        let status = wait_or_cancel(&mut child, &binary).await?;
        info!("Language server {} exited: {}", binary, status);

        let pipeline = match output.await {
            Ok(Ok(report)) => {
                debug!(?report, "Server output relay finished");
                Some(report)
            }
            Ok(Err(e)) => {
                error!("Server output relay failed: {}", e);
                None
            }
            Err(e) => {
                error!("Server output relay panicked: {}", e);
                None
            }
        };
        if let Err(e) = diagnostics.await {
            error!("Server stderr relay panicked: {}", e);
        }
        // Blocked on our own stdin; nothing left to deliver to.
        input.abort();

        Ok(SessionReport {
            exit_code: exit_code(status),
            pipeline,
        })
    }
}

fn spawn_server(binary: &str, args: &[OsString]) -> Result<Child> {
    Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| FilterError::Process {
            binary: binary.to_string(),
            msg: e.to_string(),
        })
}

/// Copy client input to the server, closing the server's stdin at EOF.
async fn relay_input<I>(mut from_client: I, mut stdin: ChildStdin)
where
    I: AsyncRead + Unpin,
{
    match tokio::io::copy(&mut from_client, &mut stdin).await {
        Ok(n) => debug!("Client input closed after {} bytes", n),
        Err(e) => warn!("Client input relay stopped: {}", e),
    }
    if let Err(e) = stdin.shutdown().await {
        debug!("Closing server stdin: {}", e);
    }
}

/// Copy server stderr to the diagnostics sink, verbatim.
async fn relay_stderr<E>(mut stderr: ChildStderr, mut sink: E)
where
    E: AsyncWrite + Unpin,
{
    match tokio::io::copy(&mut stderr, &mut sink).await {
        Ok(n) => debug!("Server stderr closed after {} bytes", n),
        Err(e) => warn!("Server stderr relay stopped: {}", e),
    }
}

/// Wait for the server, killing it on Ctrl-C.
async fn wait_or_cancel(child: &mut Child, binary: &str) -> Result<ExitStatus> {
    let waited = tokio::select! {
        status = child.wait() => status,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping language server {}", binary);
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill language server: {}", e);
            }
            child.wait().await
        }
    };
    waited.map_err(|e| FilterError::Process {
        binary: binary.to_string(),
        msg: e.to_string(),
    })
}

/// Exit code mirroring the server's, with `128 + signal` for killed servers.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn test_exit_code_passthrough() {
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
    }

    #[test]
    fn test_exit_code_signal() {
        // SIGKILL
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }
}
