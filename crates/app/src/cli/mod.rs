use clap::{Parser, Subcommand};

mod auth;
mod cart;
mod catalog;
mod checkout;
mod config;
mod orders;
mod profile;
mod report;

use config::ClientConfig;

#[derive(Debug, Parser)]
#[command(name = "apotheca-app", about = "Apotheca storefront CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in, sign out, and password recovery
    Auth(auth::AuthCommand),

    /// Browse products and categories
    Catalog(catalog::CatalogCommand),

    /// Inspect and mutate the cart
    Cart(cart::CartCommand),

    /// Submit the cart as an order
    Checkout(checkout::CheckoutArgs),

    /// Order history and status
    Orders(orders::OrdersCommand),

    /// Sales reports and per-order exports
    Report(report::ReportCommand),

    /// Show the signed-in user's profile
    Profile,
}

impl Cli {
    pub(crate) fn log_level(&self) -> &str {
        self.config.log_level()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let ctx = self.config.build_context()?;

        match self.command {
            Commands::Auth(command) => auth::run(&ctx, command).await,
            Commands::Catalog(command) => catalog::run(&ctx, command).await,
            Commands::Cart(command) => cart::run(&ctx, command).await,
            Commands::Checkout(args) => checkout::run(&ctx, args).await,
            Commands::Orders(command) => orders::run(&ctx, command).await,
            Commands::Report(command) => report::run(&ctx, command).await,
            Commands::Profile => profile::run(&ctx).await,
        }
    }
}
