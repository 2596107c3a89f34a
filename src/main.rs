use a3s_lsp_filter::{logging, Config, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_guard = logging::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => e.exit(),
    };

    let report = Session::new(config).run().await?;
    if let Some(pipeline) = &report.pipeline {
        tracing::info!(
            intercepted = pipeline.intercepted,
            degraded = pipeline.degraded,
            frames = pipeline.frames_forwarded,
            passthrough_bytes = pipeline.passthrough_bytes,
            "Session finished"
        );
    }

    // process::exit skips destructors; flush queued log lines first
    drop(log_guard);
    std::process::exit(report.exit_code);
}
