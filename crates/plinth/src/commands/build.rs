//! One-shot build command.

use anyhow::Result;

use plinth_pipeline::Runner;

use crate::config;

/// Run every transform stage once.
pub async fn run() -> Result<()> {
    let file = config::load()?;

    tracing::info!("building site...");

    let report = Runner::new(file.paths).run_all().await;

    tracing::info!(
        "build finished: {} files written, {} failed",
        report.written(),
        report.failed()
    );

    Ok(())
}
