//! Development session command.

use anyhow::Result;

use plinth_server::{DevServer, DevServerConfig};

use crate::config;

/// Run the dev session. Returns only when the process is terminated.
pub async fn run(port: Option<u16>, open: bool) -> Result<()> {
    let file = config::load()?;
    let port = port.unwrap_or(file.server.port);

    tracing::info!("starting dev session on port {}", port);

    let server_config = DevServerConfig {
        paths: file.paths,
        port,
        host: file.server.host,
        open: open && file.server.open,
        ..Default::default()
    };

    DevServer::new(server_config).start().await?;

    Ok(())
}
