//! Recording and action log subcommands.

use anyhow::{Context, Result};
use serde_json::json;

use crate::cli::RecordMode;
use crate::context::AppContext;

pub(crate) async fn handle_record(ctx: &AppContext, mode: RecordMode) -> Result<()> {
    let recorder = ctx.recorder();
    match mode {
        RecordMode::On => {
            recorder.start().await?;
            println!("Recording enabled for context '{}'", recorder.context());
        }
        RecordMode::Off => {
            let sent = recorder
                .stop_and_flush(ctx.backend.as_ref())
                .await
                .context("Recording stopped but the action log could not be sent")?;
            println!("Recording stopped; sent {} actions", sent);
        }
    }
    Ok(())
}

pub(crate) async fn handle_status(ctx: &AppContext) -> Result<()> {
    let context = &ctx.config.recording.context;
    let state = &ctx.state;
    let status = json!({
        "context": context,
        "recording": state.is_recording().await?,
        "actions": state.action_log(context).await?.len(),
        "suggestions": state.current_suggestions().await?.len(),
        "pendingConfirmations": state.pending_confirmations().await?.len(),
        "serverError": state.server_error().await?,
        "backend": ctx.config.backend.base_url,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

pub(crate) async fn handle_export(ctx: &AppContext) -> Result<()> {
    let log = ctx.state.action_log(&ctx.config.recording.context).await?;
    println!("{}", serde_json::to_string_pretty(&log)?);
    Ok(())
}

pub(crate) async fn handle_clear(ctx: &AppContext) -> Result<()> {
    let recorder = ctx.recorder();
    recorder.clear().await?;
    println!("Cleared action log for context '{}'", recorder.context());
    Ok(())
}
