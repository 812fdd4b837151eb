//! Starter-tree scaffold command.

use anyhow::{Context, Result};

use plinth_pipeline::scaffold;

use crate::config;

/// Run the setup command.
pub fn run() -> Result<()> {
    let file = config::load()?;

    scaffold::setup(&file.paths).context("failed to write starter files")?;

    tracing::info!("starter tree created");
    tracing::info!("run 'plinth' to start the dev session");

    Ok(())
}
