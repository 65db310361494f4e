//! Download token and reading progress commands.

use super::{api_failure, App};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use chrono::Utc;
use folio_session::ReadingProgress;
use serde_json::json;

/// Print a usable download token for an ebook.
pub async fn token_ensure(
    app: &App,
    ebook_id: &str,
    force: bool,
    format: &OutputFormat,
) -> Result<()> {
    let token = app
        .tokens
        .ensure_token(ebook_id, force)
        .await
        .map_err(|e| api_failure("Failed to get download token", e))?;

    // Forced tokens are not cached, so there is no expiry to report for them
    let expires_at = if force {
        None
    } else {
        app.tokens.cached(ebook_id).map(|entry| entry.expires_at)
    };

    match format {
        OutputFormat::Text => {
            println!("{}", token);
            if let Some(expires_at) = expires_at {
                let remaining = (expires_at - Utc::now()).num_seconds().max(0);
                eprintln!("Expires at {} ({}s)", expires_at.to_rfc3339(), remaining);
            }
        }
        OutputFormat::Json => output::print_json(&json!({
            "ebookId": ebook_id,
            "token": token,
            "expiresAt": expires_at,
            "cached": !force,
        })),
    }
    Ok(())
}

/// Drop the cached download token for an ebook.
pub fn token_invalidate(app: &App, ebook_id: &str, format: &OutputFormat) -> Result<()> {
    app.tokens.invalidate(ebook_id);
    output::print_success(&format!("Download token for {} invalidated", ebook_id), format);
    Ok(())
}

/// Show the saved reading position for an ebook.
pub async fn progress_get(app: &App, ebook_id: &str, format: &OutputFormat) -> Result<()> {
    let progress = app
        .api
        .reader()
        .get_progress(ebook_id)
        .await
        .map_err(|e| api_failure("Failed to load reading progress", e))?;

    match format {
        OutputFormat::Text => match progress {
            Some(progress) => println!("Last page: {}", progress.last_page),
            None => println!("No reading progress saved"),
        },
        OutputFormat::Json => output::print_json(&progress),
    }
    Ok(())
}

/// Save the reading position for an ebook.
pub async fn progress_set(
    app: &App,
    ebook_id: &str,
    page: u32,
    format: &OutputFormat,
) -> Result<()> {
    app.api
        .reader()
        .update_progress(&ReadingProgress {
            ebook_id: ebook_id.to_string(),
            last_page: page,
        })
        .await
        .map_err(|e| api_failure("Failed to save reading progress", e))?;

    output::print_success(&format!("Saved page {} for {}", page, ebook_id), format);
    Ok(())
}
