//! Emporium CLI - a command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from the environment)
//! EMPORIUM_PASSWORD=secret emporium login -e ada@example.com
//!
//! # Browse and fill the cart
//! emporium products --category laptops --page 0 --limit 12
//! emporium cart add 42 --quantity 2
//! emporium cart show
//!
//! # Check out with two address-book entries, then record the payment
//! emporium checkout user --shipping 3 --billing 3
//! emporium pay 1001 pi_123_secret_456
//!
//! # Admin
//! emporium admin orders --status pending
//! emporium admin status 1001 shipped
//! ```
//!
//! State (session, cart, refresh cookie) lives in `EMPORIUM_STATE_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;

use clap::{Args, Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emporium_core::{AddressId, OrderId, OrderStatus, ProductId};
use emporium_storefront::Shop;
use emporium_storefront::checkout::Registration;
use emporium_storefront::config::ClientConfig;

mod commands;
mod error;
mod output;

use error::CliError;

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium command-line storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and reconcile the cart with the server
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        #[command(flatten)]
        password: PasswordArg,
    },
    /// Log out and drop the local session and cart
    Logout,
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        #[command(flatten)]
        password: PasswordArg,

        /// Defaults to the password
        #[arg(long, env = "EMPORIUM_PASSWORD_CONFIRM", hide_env_values = true)]
        confirm_password: Option<String>,
    },
    /// Show the logged-in user
    Whoami,
    /// Change the logged-in user's name
    Profile {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,
    },
    /// List products, optionally one category page at a time
    Products {
        /// Category name
        #[arg(short, long)]
        category: Option<String>,

        /// Zero-based page (requires --category)
        #[arg(short, long, requires = "category")]
        page: Option<u32>,

        /// Page size
        #[arg(short, long, default_value_t = 12)]
        limit: u32,
    },
    /// Show one product
    Product { id: ProductId },
    /// Search products by name
    Search {
        query: String,

        #[arg(short, long, default_value_t = 0)]
        page: u32,

        #[arg(short, long, default_value_t = 12)]
        limit: u32,
    },
    /// List categories
    Categories,
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Mark a pending order as paid and empty the cart
    Pay {
        order_id: OrderId,
        client_secret: String,
    },
    /// List your orders
    Orders,
    /// Manage the address book
    Addresses {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Set { product_id: ProductId, quantity: u32 },
    /// Remove a line
    Remove { product_id: ProductId },
    /// Empty the cart
    Clear,
    /// Reconcile with the server cart now
    Sync,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Check out the server cart using address-book entries
    User {
        #[arg(long)]
        shipping: AddressId,

        #[arg(long)]
        billing: AddressId,
    },
    /// Check out the local cart as a guest (billed to the shipping address)
    Guest {
        #[arg(short, long)]
        email: String,

        #[command(flatten)]
        address: AddressArgs,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List addresses
    List,
    /// Add an address
    Add {
        #[command(flatten)]
        address: AddressArgs,

        #[arg(long)]
        default_shipping: bool,

        #[arg(long)]
        default_billing: bool,
    },
    /// Delete an address
    Remove { id: AddressId },
    /// Make an address the default shipping address
    DefaultShipping { id: AddressId },
    /// Make an address the default billing address
    DefaultBilling { id: AddressId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List all orders
    Orders {
        /// Only orders in this status
        #[arg(short, long)]
        status: Option<OrderStatus>,

        #[arg(short, long, default_value_t = 0)]
        page: u32,

        #[arg(short = 'n', long, default_value_t = 20)]
        size: u32,
    },
    /// Move an order to a new status
    Status { order_id: OrderId, status: OrderStatus },
}

/// Password, from `--password` or `EMPORIUM_PASSWORD`.
#[derive(Args)]
struct PasswordArg {
    #[arg(long, env = "EMPORIUM_PASSWORD", hide_env_values = true)]
    password: String,
}

/// Postal address fields.
#[derive(Args)]
pub struct AddressArgs {
    #[arg(long)]
    pub recipient: String,

    #[arg(long)]
    pub street: String,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub zipcode: String,

    #[arg(long)]
    pub country: String,

    #[arg(long)]
    pub phone: String,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.expose_secret(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "emporium_storefront=info,emporium_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(CliError::from(e)),
    };

    if let Err(e) = result {
        e.report();
        output::failure(&e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let shop = Shop::from_config(config)?;

    // Pick up a sync left pending by an earlier run; failures keep the gate open.
    if !matches!(cli.command, Commands::Logout | Commands::Login { .. }) {
        commands::cart::sync_quietly(&shop).await;
    }

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&shop, &email, password.password).await?;
        }
        Commands::Logout => commands::auth::logout(&shop).await?,
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let confirm_password = confirm_password.unwrap_or_else(|| password.password.clone());
            let form = Registration {
                first_name,
                last_name,
                email,
                password: SecretString::from(password.password),
                confirm_password: SecretString::from(confirm_password),
            };
            commands::auth::register(&shop, form).await?;
        }
        Commands::Whoami => commands::auth::whoami(&shop),
        Commands::Profile {
            first_name,
            last_name,
        } => commands::auth::profile(&shop, &first_name, &last_name).await?,
        Commands::Products {
            category,
            page,
            limit,
        } => commands::catalog::products(&shop, category.as_deref(), page, limit).await?,
        Commands::Product { id } => commands::catalog::product(&shop, id).await?,
        Commands::Search { query, page, limit } => {
            commands::catalog::search(&shop, &query, page, limit).await?;
        }
        Commands::Categories => commands::catalog::categories(&shop).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&shop),
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&shop, product_id, quantity).await?,
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&shop, product_id, quantity).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&shop, product_id).await?,
            CartAction::Clear => commands::cart::clear(&shop).await?,
            CartAction::Sync => commands::cart::sync(&shop).await?,
        },
        Commands::Checkout { action } => match action {
            CheckoutAction::User { shipping, billing } => {
                commands::orders::checkout_user(&shop, shipping, billing).await?;
            }
            CheckoutAction::Guest { email, address } => {
                commands::orders::checkout_guest(&shop, email, address).await?;
            }
        },
        Commands::Pay {
            order_id,
            client_secret,
        } => commands::orders::pay(&shop, order_id, client_secret)?,
        Commands::Orders => commands::orders::list(&shop).await?,
        Commands::Addresses { action } => match action {
            AddressAction::List => commands::addresses::list(&shop).await?,
            AddressAction::Add {
                address,
                default_shipping,
                default_billing,
            } => {
                commands::addresses::add(&shop, address, default_shipping, default_billing)
                    .await?;
            }
            AddressAction::Remove { id } => commands::addresses::remove(&shop, id).await?,
            AddressAction::DefaultShipping { id } => {
                commands::addresses::default_shipping(&shop, id).await?;
            }
            AddressAction::DefaultBilling { id } => {
                commands::addresses::default_billing(&shop, id).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Orders { status, page, size } => {
                commands::admin::orders(&shop, status, page, size).await?;
            }
            AdminAction::Status { order_id, status } => {
                commands::admin::set_status(&shop, order_id, status).await?;
            }
        },
    }
    Ok(())
}
