//! Cart management.

use anyhow::{bail, Result};
use dialoguer::Confirm;
use shop_commerce::cart::{summarize, CartLineItem, CartStore, CartSummary};
use shop_commerce::LineItemId;

use super::catalog::{fetch_accessory, resolve_selection};
use super::{CartArgs, CartCommand};
use crate::context::Context;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let store = CartStore::new(&ctx.cache()?);

    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => {
            print_cart(&store.summary()?, ctx);
            Ok(())
        }
        CartCommand::Add {
            product,
            color,
            storage,
            quantity,
        } => {
            let resolver = resolve_selection(
                ctx,
                &product,
                color.as_deref(),
                storage.as_deref(),
                Some(quantity),
            )
            .await?;
            add_line(&store, resolver.to_line_item()?, ctx)
        }
        CartCommand::AddAccessory { slug, quantity } => {
            let accessory = fetch_accessory(ctx, &slug).await?;
            if !accessory.stock().status().is_purchasable() {
                ctx.output.warn(&format!("{} is currently out of stock", accessory.name));
            }
            add_line(&store, CartLineItem::for_accessory(&accessory, quantity), ctx)
        }
        CartCommand::Remove { id } => {
            let id = existing_line(&store, &id)?;
            let lines = store.remove(&id)?;
            ctx.output.success(&format!("Removed {}", id));
            print_cart(&summarize(lines)?, ctx);
            Ok(())
        }
        CartCommand::Set { id, quantity } => {
            let id = existing_line(&store, &id)?;
            let lines = store.set_quantity(&id, quantity)?;
            if quantity <= 0 {
                ctx.output.success(&format!("Removed {}", id));
            } else {
                ctx.output.success(&format!("Set {} to {}", id, quantity));
            }
            print_cart(&summarize(lines)?, ctx);
            Ok(())
        }
        CartCommand::Decrement { id } => {
            let id = existing_line(&store, &id)?;
            let lines = store.decrement(&id)?;
            print_cart(&summarize(lines)?, ctx);
            Ok(())
        }
        CartCommand::Clear { yes } => {
            if store.load()?.is_empty() {
                ctx.output.info("Cart is already empty.");
                return Ok(());
            }
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Remove every item from the cart?")
                    .default(false)
                    .interact()?;
                if !confirmed {
                    ctx.output.info("Cart left as is.");
                    return Ok(());
                }
            }
            store.clear()?;
            ctx.output.success("Cart cleared");
            Ok(())
        }
    }
}

fn add_line(store: &CartStore, line: CartLineItem, ctx: &Context) -> Result<()> {
    let label = format!("{} x {} ({}, {})", line.quantity, line.name, line.color, line.storage);
    let lines = store.add(line)?;
    ctx.output.success(&format!("Added {}", label));
    print_cart(&summarize(lines)?, ctx);
    Ok(())
}

/// The line id as stored, or an error naming the ids that exist.
fn existing_line(store: &CartStore, id: &str) -> Result<LineItemId> {
    let lines = store.load()?;
    match lines.iter().find(|l| l.id.as_str() == id) {
        Some(line) => Ok(line.id.clone()),
        None if lines.is_empty() => bail!("Cart is empty"),
        None => {
            let known: Vec<&str> = lines.iter().map(|l| l.id.as_str()).collect();
            bail!("No cart line '{}'. Lines: {}", id, known.join(", "))
        }
    }
}

/// Print the cart with per-line subtotals and the grand total.
pub(crate) fn print_cart(summary: &CartSummary, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(summary);
        return;
    }

    if summary.is_empty() {
        ctx.output.info("Your cart is empty.");
        return;
    }

    ctx.output.header(&format!("Cart ({} items)", summary.item_count));
    let widths = [28, 28, 14, 4, 12];
    ctx.output.table_row(&["ID", "ITEM", "OPTION", "QTY", "SUBTOTAL"], &widths);
    for line in &summary.lines {
        let subtotal = line
            .subtotal()
            .map(|m| m.display())
            .unwrap_or_else(|_| "-".to_string());
        let option = format!("{} {}", line.color, line.storage);
        ctx.output.table_row(
            &[
                line.id.as_str(),
                &line.name,
                &option,
                &line.quantity.to_string(),
                &subtotal,
            ],
            &widths,
        );
    }
    ctx.output.kv("total", &summary.total.display());
}
