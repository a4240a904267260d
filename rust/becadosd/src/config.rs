use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "becadosd",
    about = "Hour-tracking sidecar: availability, evidence, and combined schedules over JSON lines",
    version
)]
pub struct Config {
    /// Workspace directory to open at startup
    #[arg(long, env = "BECADOS_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Log filter directive, e.g. "debug" or "becadosd=trace"
    #[arg(long = "log", env = "BECADOS_LOG", default_value = "info")]
    pub log_filter: String,
}

/// Logs go to stderr; stdout carries the IPC stream.
pub fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
