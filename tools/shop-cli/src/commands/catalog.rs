//! Browsing products and accessories.

use anyhow::{Context as _, Result};
use shop_commerce::catalog::{Accessory, Product, VariantResolver};

use super::{AccessoriesArgs, AccessoriesCommand, ProductArgs, ProductsArgs};
use crate::context::Context;
use crate::output::{format_price, stock_badge};

/// Run the products command.
pub async fn run_products(args: ProductsArgs, ctx: &Context) -> Result<()> {
    let api = ctx.api();
    let spinner = ctx.output.spinner("Fetching products...");
    let page = api
        .list_products(args.brand.as_deref(), args.page)
        .await
        .context("Failed to list products");
    spinner.finish_and_clear();
    let page = page?;

    if ctx.output.is_json() {
        ctx.output.json(&page);
        return Ok(());
    }

    match &args.brand {
        Some(brand) => ctx.output.header(&format!("{} phones ({})", brand, page.count)),
        None => ctx.output.header(&format!("Phones ({})", page.count)),
    }

    if page.results.is_empty() {
        ctx.output.info("No products found.");
        return Ok(());
    }

    let widths = [8, 32, 12, 12, 10];
    ctx.output.table_row(&["ID", "NAME", "BRAND", "FROM", "VARIANTS"], &widths);
    for product in &page.results {
        let from = lowest_price(product);
        ctx.output.table_row(
            &[
                product.id.as_str(),
                &product.name,
                product.brand.as_deref().unwrap_or("-"),
                &format_price(from.as_ref()),
                &product.variants.len().to_string(),
            ],
            &widths,
        );
    }

    let current = args.page.unwrap_or(1);
    if page.has_previous() {
        ctx.output.debug(&format!("previous: --page {}", current.saturating_sub(1)));
    }
    if page.has_next() {
        ctx.output.info(&format!("More results: --page {}", next_page(current)));
    }

    Ok(())
}

fn next_page(current: u32) -> u32 {
    current.saturating_add(1)
}

/// Run the product command.
pub async fn run_product(args: ProductArgs, ctx: &Context) -> Result<()> {
    let resolver = resolve_selection(
        ctx,
        &args.product,
        args.color.as_deref(),
        args.storage.as_deref(),
        args.quantity,
    )
    .await?;

    let view = resolver.view();
    if ctx.output.is_json() {
        ctx.output.json(&view);
        return Ok(());
    }

    let product = resolver.product();
    ctx.output.header(&product.name);
    if let Some(brand) = &product.brand {
        ctx.output.kv("brand", brand);
    }
    if let Some(rating) = product.rating {
        ctx.output.kv("rating", &format!("{:.1} ({} reviews)", rating, product.num_reviews));
    }
    if let Some(description) = &product.description {
        ctx.output.kv("about", description);
    }

    if product.has_variants() {
        ctx.output.kv("colors", &resolver.colors().join(", "));
        ctx.output.kv("storage", &resolver.storages_for(resolver.color()).join(", "));
    }

    ctx.output.header("Selected");
    ctx.output.kv("color", &view.color);
    ctx.output.kv("storage", &view.storage);
    if let Some(variant_id) = &view.variant_id {
        ctx.output.kv("variant", variant_id.as_str());
    }
    ctx.output.kv("price", &format_price(view.price.as_ref()));
    if let Some(image) = &view.image {
        ctx.output.kv("image", image);
    }
    ctx.output.kv("stock", &stock_badge(view.stock_status));
    if let Some(available) = view.available_stock {
        ctx.output.kv("available", &available.to_string());
    }
    let ceiling = view
        .max_purchase_quantity
        .map(|m| m.to_string())
        .unwrap_or_else(|| "no limit".to_string());
    ctx.output.kv("quantity", &format!("{} (max {})", view.quantity, ceiling));

    Ok(())
}

/// Run the accessories command.
pub async fn run_accessories(args: AccessoriesArgs, ctx: &Context) -> Result<()> {
    match args.command.unwrap_or(AccessoriesCommand::List) {
        AccessoriesCommand::List => list_accessories(ctx).await,
        AccessoriesCommand::Show { slug } => show_accessory(&slug, ctx).await,
    }
}

async fn list_accessories(ctx: &Context) -> Result<()> {
    let api = ctx.api();
    let spinner = ctx.output.spinner("Fetching accessories...");
    let accessories = api.list_accessories().await.context("Failed to list accessories");
    spinner.finish_and_clear();
    let accessories = accessories?;

    if ctx.output.is_json() {
        ctx.output.json(&accessories);
        return Ok(());
    }

    ctx.output.header(&format!("Accessories ({})", accessories.len()));
    let widths = [24, 32, 10, 14];
    ctx.output.table_row(&["SLUG", "NAME", "PRICE", "STOCK"], &widths);
    for accessory in &accessories {
        ctx.output.table_row(
            &[
                accessory.slug.as_deref().unwrap_or("-"),
                &accessory.name,
                &accessory.price.display(),
                &stock_badge(accessory.stock().status()),
            ],
            &widths,
        );
    }

    Ok(())
}

async fn show_accessory(slug: &str, ctx: &Context) -> Result<()> {
    let accessory = fetch_accessory(ctx, slug).await?;

    if ctx.output.is_json() {
        ctx.output.json(&accessory);
        return Ok(());
    }

    ctx.output.header(&accessory.name);
    if let Some(brand) = &accessory.brand {
        ctx.output.kv("brand", brand);
    }
    ctx.output.kv("price", &accessory.price.display());
    ctx.output.kv("stock", &stock_badge(accessory.stock().status()));
    if let Some(description) = &accessory.description {
        ctx.output.kv("about", description);
    }

    Ok(())
}

/// Fetch a product and apply a color/storage/quantity selection to it.
pub(crate) async fn resolve_selection(
    ctx: &Context,
    product: &str,
    color: Option<&str>,
    storage: Option<&str>,
    quantity: Option<u32>,
) -> Result<VariantResolver> {
    let api = ctx.api();
    let spinner = ctx.output.spinner(&format!("Fetching {}...", product));
    let fetched = api
        .lookup_product(product)
        .await
        .with_context(|| format!("Failed to fetch product {}", product));
    spinner.finish_and_clear();

    let mut resolver = VariantResolver::new(fetched?);
    resolver.select(color, storage)?;
    if let Some(quantity) = quantity {
        resolver.set_quantity(quantity);
        if resolver.quantity() != quantity {
            ctx.output.warn(&format!(
                "Quantity adjusted to {} for this variant",
                resolver.quantity()
            ));
        }
    }
    Ok(resolver)
}

pub(crate) async fn fetch_accessory(ctx: &Context, slug: &str) -> Result<Accessory> {
    let api = ctx.api();
    let spinner = ctx.output.spinner(&format!("Fetching {}...", slug));
    let accessory = api
        .accessory(slug)
        .await
        .with_context(|| format!("Failed to fetch accessory {}", slug));
    spinner.finish_and_clear();
    accessory
}

/// Cheapest variant price, else the base price.
fn lowest_price(product: &Product) -> Option<shop_commerce::Money> {
    product
        .variants
        .iter()
        .map(|v| v.price)
        .min_by_key(|p| p.amount_cents)
        .or(product.base_price)
}
