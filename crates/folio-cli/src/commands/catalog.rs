//! Catalog commands.

use super::{api_failure, App};
use crate::output::{self, money, truncate, OutputFormat};
use anyhow::Result;
use folio_session::{EbookSummary, FilterOverrides};

fn ownership(book: &EbookSummary) -> &'static str {
    match (book.has_purchased, book.can_download) {
        (true, true) => "owned",
        (true, false) => "purchased",
        _ => "",
    }
}

/// List catalog entries.
pub async fn books_list(
    app: &App,
    search: Option<String>,
    tag: Option<String>,
    page: Option<u32>,
    format: &OutputFormat,
) -> Result<()> {
    let result = app
        .catalog
        .fetch_ebooks(FilterOverrides { search, tag, page })
        .await
        .map_err(|e| api_failure("Failed to list ebooks", e))?;

    match format {
        OutputFormat::Text => {
            if result.items.is_empty() {
                println!("No ebooks found");
                return Ok(());
            }
            println!("{:<36} {:<32} {:<24} {:>8} {}", "ID", "Title", "Author", "Price", "");
            output::print_divider(110);
            for book in &result.items {
                println!(
                    "{:<36} {:<32} {:<24} {:>8} {}",
                    book.id,
                    truncate(&book.title, 32),
                    truncate(&book.author, 24),
                    money(book.price),
                    ownership(book)
                );
            }
            println!(
                "\nPage {} of {} ({} total)",
                result.meta.page,
                result.meta.page_count(),
                result.meta.total
            );
        }
        OutputFormat::Json => output::print_json(&result),
    }

    Ok(())
}

/// Show one catalog entry.
pub async fn books_show(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    let book = app
        .api
        .ebooks()
        .detail(id)
        .await
        .map_err(|e| api_failure("Failed to load ebook", e))?;

    match format {
        OutputFormat::Text => {
            output::print_heading(&book.title);
            output::print_row("ID", &book.id);
            output::print_row("Author", &book.author);
            output::print_row("Price", &money(book.price));
            output::print_row("Published", if book.is_published { "yes" } else { "no" });
            if !book.tags.is_empty() {
                output::print_row("Tags", &book.tags.join(", "));
            }
            output::print_row("Added", &book.created_at.format("%Y-%m-%d").to_string());
            output::print_row("Purchased", if book.has_purchased { "yes" } else { "no" });
            output::print_row("Download", if book.can_download { "available" } else { "-" });
            if !book.description.is_empty() {
                println!("\n{}", book.description);
            }
        }
        OutputFormat::Json => output::print_json(&book),
    }

    Ok(())
}

/// Publish a draft entry. Admin only.
pub async fn books_publish(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    app.api
        .ebooks()
        .publish(id)
        .await
        .map_err(|e| api_failure("Failed to publish ebook", e))?;
    output::print_success(&format!("Published {}", id), format);
    Ok(())
}

/// Delete an entry. Admin only.
pub async fn books_delete(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    app.api
        .ebooks()
        .remove(id)
        .await
        .map_err(|e| api_failure("Failed to delete ebook", e))?;
    output::print_success(&format!("Deleted {}", id), format);
    Ok(())
}

/// List tags.
pub async fn tags_list(app: &App, format: &OutputFormat) -> Result<()> {
    let tags = app
        .catalog
        .fetch_tags()
        .await
        .map_err(|e| api_failure("Failed to list tags", e))?;

    match format {
        OutputFormat::Text => {
            if tags.is_empty() {
                println!("No tags found");
            }
            for tag in &tags {
                println!("{:<36} {}", tag.id, tag.name);
            }
        }
        OutputFormat::Json => output::print_json(&tags),
    }

    Ok(())
}
