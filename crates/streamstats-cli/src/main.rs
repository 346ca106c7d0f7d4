//! Entry point of the `streamstats` command.

use anyhow::Context;
use clap::Parser;
use streamstats_cli::{App, Cli};
use streamstats_common::init_logging;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cancel = CancellationToken::new();

    let app = App::load(&cli, cancel.clone()).context("Failed to initialize streamstats")?;
    let _log_guard = init_logging(&app.config().logging).context("Failed to initialize logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting streamstats");

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight work");
            interrupt.cancel();
        }
    });

    let mut out = std::io::stdout();
    app.run(&cli.command, &mut out).await.context("Command failed")?;
    Ok(())
}
