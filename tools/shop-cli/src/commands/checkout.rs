//! Hosted checkout and the return landings.

use anyhow::{bail, Context as _, Result};
use console::style;
use shop_commerce::checkout::{
    CancelOutcome, CheckoutInitiator, CheckoutStarted, CommitOutcome, Navigator, OrderSummary,
    Reconciler, SuccessOutcome, SummarySource,
};

use super::catalog::resolve_selection;
use super::{CheckoutArgs, CheckoutCommand};
use crate::context::Context;
use crate::output::{format_price, Output};

/// Navigator for a terminal: prints the hosted checkout link.
struct TerminalNavigator {
    output: Output,
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, url: &str) {
        if self.output.is_json() {
            return;
        }
        println!("\n  Continue to payment: {}\n", style(url).cyan().underlined());
    }
}

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    match args.command {
        CheckoutCommand::Cart => checkout_cart(ctx).await,
        CheckoutCommand::BuyNow {
            product,
            color,
            storage,
            quantity,
        } => buy_now(&product, color.as_deref(), storage.as_deref(), quantity, ctx).await,
        CheckoutCommand::Success { session_id } => success(session_id.as_deref(), ctx).await,
        CheckoutCommand::Cancel { session_id } => cancel(session_id.as_deref(), ctx).await,
    }
}

fn initiator(ctx: &Context) -> Result<CheckoutInitiator> {
    Ok(CheckoutInitiator::new(
        ctx.api(),
        &ctx.cache()?,
        ctx.return_urls(),
        TerminalNavigator {
            output: ctx.output.clone(),
        },
    ))
}

async fn checkout_cart(ctx: &Context) -> Result<()> {
    let initiator = initiator(ctx)?;

    let spinner = ctx.output.spinner("Creating checkout session...");
    let started = initiator.checkout_cart().await;
    spinner.finish_and_clear();

    report_started(started.context("Checkout failed")?, ctx);
    Ok(())
}

async fn buy_now(
    product: &str,
    color: Option<&str>,
    storage: Option<&str>,
    quantity: u32,
    ctx: &Context,
) -> Result<()> {
    let resolver = resolve_selection(ctx, product, color, storage, Some(quantity)).await?;
    if !resolver.stock_status().is_purchasable() && resolver.product().has_variants() {
        bail!(
            "{} ({}, {}) is out of stock",
            resolver.product().name,
            resolver.color(),
            resolver.storage()
        );
    }
    let Some(variant) = resolver.active_variant() else {
        bail!("{} has no variants to buy", resolver.product().name);
    };

    ctx.output.info(&format!(
        "{} x {} ({}, {}) at {}",
        resolver.quantity(),
        resolver.product().name,
        resolver.color(),
        resolver.storage(),
        format_price(resolver.price().as_ref()),
    ));

    let initiator = initiator(ctx)?;
    let spinner = ctx.output.spinner("Creating checkout session...");
    let started = initiator
        .buy_now(variant.id.clone(), resolver.quantity())
        .await;
    spinner.finish_and_clear();

    report_started(started.context("Buy now failed")?, ctx);
    Ok(())
}

fn report_started(started: CheckoutStarted, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&started);
        return;
    }
    match &started.session_id {
        Some(id) => ctx.output.success(&format!("Checkout session {} created", id)),
        None => ctx.output.success("Checkout session created"),
    }
    ctx.output.info("Run `shop checkout success` or `shop checkout cancel` after paying.");
}

async fn success(session_id: Option<&str>, ctx: &Context) -> Result<()> {
    let reconciler = Reconciler::new(ctx.api(), &ctx.cache()?);

    let spinner = ctx.output.spinner("Confirming your order...");
    let outcome = reconciler.success(session_id).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    if ctx.output.is_json() {
        ctx.output.json(&outcome);
        return Ok(());
    }

    match outcome {
        SuccessOutcome::NoSession => {
            ctx.output.success("Thank you for your order!");
            ctx.output.info("No checkout session was found, so there is no summary to show.");
        }
        SuccessOutcome::Completed { summary, commit, .. } => {
            ctx.output.success("Thank you for your order!");
            print_summary(&summary, ctx);
            match commit {
                CommitOutcome::Committed | CommitOutcome::Skipped => {}
                CommitOutcome::NotAttempted => ctx
                    .output
                    .warn("Order details are unavailable right now; showing your cart instead."),
                CommitOutcome::Failed(error) => {
                    ctx.output.warn(&format!("Inventory update failed: {}", error))
                }
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &OrderSummary, ctx: &Context) {
    ctx.output.header("Order summary");
    ctx.output.kv("session", summary.session_id.as_str());
    ctx.output.kv("status", &summary.status);
    if let Some(email) = &summary.customer_email {
        ctx.output.kv("email", email);
    }
    for item in &summary.items {
        ctx.output.list_item(&format!(
            "{} x {}  {}",
            item.quantity,
            item.name,
            format_price(item.amount.as_ref())
        ));
    }
    ctx.output.kv("total", &summary.total.display());

    if let Some(name) = &summary.shipping_name {
        ctx.output.kv("ship to", name);
    }
    if let Some(address) = &summary.shipping_address {
        ctx.output.kv("address", address);
    }
    if summary.source == SummarySource::CartSnapshot {
        ctx.output.debug("summary built from the cart snapshot");
    }
}

async fn cancel(session_id: Option<&str>, ctx: &Context) -> Result<()> {
    let reconciler = Reconciler::new(ctx.api(), &ctx.cache()?);

    let spinner = ctx.output.spinner("Canceling checkout...");
    let outcome = reconciler.cancel(session_id).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    if ctx.output.is_json() {
        ctx.output.json(&outcome);
        return Ok(());
    }

    match &outcome {
        CancelOutcome::NoSession | CancelOutcome::Released { .. } => {
            ctx.output.info(outcome.message())
        }
        CancelOutcome::ReleaseFailed { error, .. } => {
            ctx.output.warn(outcome.message());
            ctx.output.debug(error);
        }
    }
    ctx.output.info("Your cart has been kept.");

    Ok(())
}
