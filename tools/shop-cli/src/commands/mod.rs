//! CLI command implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod webhook;

use clap::{Args, Subcommand};

/// Arguments for the products command.
#[derive(Args)]
pub struct ProductsArgs {
    /// Only list this brand.
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Page of the listing.
    #[arg(short, long)]
    pub page: Option<u32>,
}

/// Arguments for the product command.
#[derive(Args)]
pub struct ProductArgs {
    /// Numeric product id or slug.
    pub product: String,

    /// Color to select.
    #[arg(long)]
    pub color: Option<String>,

    /// Storage to select.
    #[arg(long)]
    pub storage: Option<String>,

    /// Quantity to hold; clamped to what may be bought.
    #[arg(short, long)]
    pub quantity: Option<u32>,
}

/// Arguments for the accessories command.
#[derive(Args)]
pub struct AccessoriesArgs {
    #[command(subcommand)]
    pub command: Option<AccessoriesCommand>,
}

#[derive(Subcommand)]
pub enum AccessoriesCommand {
    /// List all accessories.
    List,
    /// Show one accessory.
    Show {
        /// Accessory slug.
        slug: String,
    },
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart.
    Show,
    /// Add a product variant to the cart.
    Add {
        /// Numeric product id or slug.
        product: String,

        /// Color to add.
        #[arg(long)]
        color: Option<String>,

        /// Storage to add.
        #[arg(long)]
        storage: Option<String>,

        /// Quantity to add.
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Add an accessory to the cart.
    AddAccessory {
        /// Accessory slug.
        slug: String,

        /// Quantity to add.
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Remove a line.
    Remove {
        /// Line id.
        id: String,
    },
    /// Set a line's quantity; zero or less removes it.
    Set {
        /// Line id.
        id: String,
        /// New quantity.
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Take one unit off a line.
    Decrement {
        /// Line id.
        id: String,
    },
    /// Empty the cart.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    #[command(subcommand)]
    pub command: CheckoutCommand,
}

#[derive(Subcommand)]
pub enum CheckoutCommand {
    /// Start a hosted checkout for the whole cart.
    Cart,
    /// Start a hosted checkout for one variant.
    BuyNow {
        /// Numeric product id or slug.
        product: String,

        /// Color to buy.
        #[arg(long)]
        color: Option<String>,

        /// Storage to buy.
        #[arg(long)]
        storage: Option<String>,

        /// Quantity to buy.
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Land on the success page.
    Success {
        /// Value of the `session_id` query parameter.
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Land on the cancel page.
    Cancel {
        /// Value of the `session_id` query parameter.
        #[arg(long)]
        session_id: Option<String>,
    },
}

/// Arguments for the webhook command.
#[derive(Args)]
pub struct WebhookArgs {
    #[command(subcommand)]
    pub command: WebhookCommand,
}

#[derive(Subcommand)]
pub enum WebhookCommand {
    /// Verify a signed payload and classify the event.
    Verify {
        /// File holding the raw request body.
        #[arg(short, long)]
        payload: String,

        /// Value of the signature header.
        #[arg(short, long)]
        signature: String,

        /// Endpoint secret; defaults to the configured one.
        #[arg(long)]
        secret: Option<String>,
    },
    /// Sign a payload, for exercising a webhook endpoint.
    Sign {
        /// File holding the raw request body.
        #[arg(short, long)]
        payload: String,

        /// Endpoint secret; defaults to the configured one.
        #[arg(long)]
        secret: Option<String>,

        /// Unix timestamp to sign with; defaults to now.
        #[arg(long)]
        timestamp: Option<i64>,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Get a config value.
    Get {
        /// Config key (dot-separated).
        key: String,
    },
    /// Set a config value.
    Set {
        /// Config key (dot-separated).
        key: String,
        /// Value to set.
        value: String,
    },
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
