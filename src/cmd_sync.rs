//! `sync` subcommand.

use anyhow::Result;
use tracing::info;

use recorder_sync::{ShutdownSignal, SyncDaemon};

use crate::context::AppContext;

pub(crate) async fn handle_sync(ctx: AppContext, once: bool) -> Result<()> {
    let daemon = SyncDaemon::new(ctx.state.clone(), ctx.backend.clone(), &ctx.config.sync);

    if once {
        let report = daemon.drain_once().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let shutdown = ShutdownSignal::new();
    shutdown.listen_os_signals()?;
    info!("Press Ctrl-C to stop");
    daemon.run(shutdown.subscribe()).await;
    Ok(())
}
