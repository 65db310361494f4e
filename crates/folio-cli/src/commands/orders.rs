//! Order commands.

use super::{api_failure, App};
use crate::output::{self, money, truncate, OutputFormat};
use anyhow::Result;
use folio_session::{CreateOrderInput, Order};

fn book_title(order: &Order) -> String {
    order
        .ebook
        .as_ref()
        .map(|ebook| ebook.title.clone())
        .unwrap_or_else(|| order.ebook_id.clone())
}

fn print_order(order: &Order) {
    output::print_heading(&format!("Order {}", order.id));
    output::print_row("Ebook", &book_title(order));
    output::print_row("Amount", &money(order.amount));
    output::print_row("Status", &order.status.to_string());
    output::print_row("Provider", &order.payment_provider);
    if let Some(reference) = &order.payment_reference {
        output::print_row("Reference", reference);
    }
    output::print_row("Created", &order.created_at.to_rfc3339());
    output::print_row("Updated", &order.updated_at.to_rfc3339());
}

/// List the current user's orders, or every order with `all` (admin only).
pub async fn orders_list(app: &App, all: bool, format: &OutputFormat) -> Result<()> {
    if all {
        let orders = app
            .api
            .orders()
            .list_all()
            .await
            .map_err(|e| api_failure("Failed to list orders", e))?;

        match format {
            OutputFormat::Text => {
                if orders.is_empty() {
                    println!("No orders found");
                    return Ok(());
                }
                println!("{:<36} {:<28} {:<28} {:>8} {}", "ID", "Buyer", "Ebook", "Amount", "Status");
                output::print_divider(112);
                for entry in &orders {
                    println!(
                        "{:<36} {:<28} {:<28} {:>8} {}",
                        entry.order.id,
                        truncate(&entry.user.email, 28),
                        truncate(&book_title(&entry.order), 28),
                        money(entry.order.amount),
                        entry.order.status
                    );
                }
            }
            OutputFormat::Json => output::print_json(&orders),
        }
        return Ok(());
    }

    let orders = app
        .api
        .orders()
        .list_mine()
        .await
        .map_err(|e| api_failure("Failed to list orders", e))?;

    match format {
        OutputFormat::Text => {
            if orders.is_empty() {
                println!("No orders found");
                return Ok(());
            }
            println!("{:<36} {:<32} {:>8} {}", "ID", "Ebook", "Amount", "Status");
            output::print_divider(90);
            for order in &orders {
                println!(
                    "{:<36} {:<32} {:>8} {}",
                    order.id,
                    truncate(&book_title(order), 32),
                    money(order.amount),
                    order.status
                );
            }
        }
        OutputFormat::Json => output::print_json(&orders),
    }

    Ok(())
}

/// Show one order.
pub async fn orders_show(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    let order = app
        .api
        .orders()
        .detail(id)
        .await
        .map_err(|e| api_failure("Failed to load order", e))?;

    match format {
        OutputFormat::Text => print_order(&order),
        OutputFormat::Json => output::print_json(&order),
    }
    Ok(())
}

/// Re-check an order's payment status with the provider.
pub async fn orders_refresh(app: &App, id: &str, format: &OutputFormat) -> Result<()> {
    let order = app
        .api
        .orders()
        .refresh(id)
        .await
        .map_err(|e| api_failure("Failed to refresh order", e))?;

    match format {
        OutputFormat::Text => print_order(&order),
        OutputFormat::Json => output::print_json(&order),
    }
    Ok(())
}

/// Start checkout for an ebook.
pub async fn orders_create(
    app: &App,
    ebook_id: &str,
    provider: &str,
    format: &OutputFormat,
) -> Result<()> {
    let summary = app
        .api
        .orders()
        .create(&CreateOrderInput {
            ebook_id: ebook_id.to_string(),
            payment_provider: provider.to_string(),
        })
        .await
        .map_err(|e| api_failure("Failed to create order", e))?;

    match format {
        OutputFormat::Text => {
            println!("Order {} created ({})", summary.order_id, summary.status);
            match &summary.invoice_url {
                Some(url) => println!("Complete payment at: {}", url),
                None => println!("No invoice issued; check status with 'folio orders refresh {}'", summary.order_id),
            }
        }
        OutputFormat::Json => output::print_json(&summary),
    }
    Ok(())
}
