//! `suggest` subcommand.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use recorder_core::{Document, Page};
use recorder_review::{OriginCoordinator, SuggestionStore};

use crate::context::AppContext;

pub(crate) async fn handle_suggest(
    ctx: AppContext,
    html_file: &Path,
    url: Option<String>,
) -> Result<()> {
    let html = tokio::fs::read_to_string(html_file)
        .await
        .with_context(|| format!("Failed to read {}", html_file.display()))?;
    let url = url.unwrap_or_else(|| format!("file://{}", html_file.display()));
    let mut page = Page::loaded(url, Document::parse_html(&html));

    let coordinator = OriginCoordinator::new(SuggestionStore::new(ctx.state.clone()), ctx.backend);
    let outcome = coordinator.load_suggestions(&mut page).await?;
    let markers = coordinator.markers().markers().len();
    info!(
        suggestions = outcome.suggestions.len(),
        markers, "Suggestions loaded"
    );

    let summary = json!({
        "url": page.url,
        "markers": markers,
        "serverDurationMs": outcome.server_duration_ms,
        "totalRequestDurationMs": outcome.total_request_duration_ms,
        "suggestions": outcome.suggestions,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
