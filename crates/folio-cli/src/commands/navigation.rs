//! Route inspection.

use super::App;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use folio_session::{redirect_href, Navigation};
use serde_json::json;

/// Resolve a path through the router and report where navigation would land.
pub async fn open(app: &App, path: &str, format: &OutputFormat) -> Result<()> {
    let navigation = app.router.navigate(path).await;

    match format {
        OutputFormat::Text => match &navigation {
            Navigation::Allowed(target) => {
                println!("Allowed: {} ({})", target.full_path, target.name);
                for (key, value) in &target.params {
                    output::print_row(key, value);
                }
            }
            Navigation::Redirected { from, to } => {
                println!("Redirected: {} -> {}", from.full_path, redirect_href(to));
            }
            Navigation::NotFound(path) => {
                output::print_error(&format!("No route matches {}", path), format);
            }
        },
        OutputFormat::Json => {
            let value = match &navigation {
                Navigation::Allowed(target) => json!({
                    "decision": "allow",
                    "route": target.name.as_str(),
                    "path": target.full_path,
                    "params": target.params,
                }),
                Navigation::Redirected { from, to } => json!({
                    "decision": "redirect",
                    "route": from.name.as_str(),
                    "path": from.full_path,
                    "to": redirect_href(to),
                }),
                Navigation::NotFound(path) => json!({
                    "decision": "not_found",
                    "path": path,
                }),
            };
            output::print_json(&value);
        }
    }

    Ok(())
}
