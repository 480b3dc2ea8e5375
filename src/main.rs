use color_eyre::Result;
use curator::cli::{parse_args, run_cli_command};
use tracing_subscriber::EnvFilter;

/// Log filter variable; falls back to `RUST_LOG`, then `info`.
const LOG_ENV: &str = "CURATOR_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the JSON lines, so logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let command = parse_args(std::env::args());
    run_cli_command(command).await
}
