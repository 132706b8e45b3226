//! Shop CLI - Command line client for the phone storefront.
//!
//! Commands:
//! - `shop products` - List phones, optionally by brand
//! - `shop product` - Inspect a phone and pick a variant
//! - `shop accessories` - List or show accessories
//! - `shop cart` - Manage the cart
//! - `shop checkout` - Start a hosted checkout and land on its return pages
//! - `shop webhook` - Verify or sign a webhook payload
//! - `shop config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::{
    AccessoriesArgs, CartArgs, CheckoutArgs, ConfigArgs, ProductArgs, ProductsArgs, WebhookArgs,
};

/// Shop CLI - Browse the storefront, manage a cart and check out
#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List phones
    Products(ProductsArgs),

    /// Show a phone and resolve a variant selection
    Product(ProductArgs),

    /// List or show accessories
    Accessories(AccessoriesArgs),

    /// Manage the cart
    Cart(CartArgs),

    /// Check out and handle the success/cancel landings
    Checkout(CheckoutArgs),

    /// Verify or sign webhook payloads
    Webhook(WebhookArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Products(args) => commands::catalog::run_products(args, &ctx).await,
        Commands::Product(args) => commands::catalog::run_product(args, &ctx).await,
        Commands::Accessories(args) => commands::catalog::run_accessories(args, &ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Webhook(args) => commands::webhook::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
