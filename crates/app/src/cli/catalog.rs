use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use tracing::warn;

use apotheca_app::{catalog::ProductFilter, context::AppContext};

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// Search the product listing
    Search(SearchArgs),

    /// List product categories
    Categories,

    /// List storefront banners
    Banners,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Name substring to match
    #[arg(long)]
    query: Option<String>,

    /// Category key to restrict to
    #[arg(long)]
    category: Option<String>,

    /// Inclusive lower price bound
    #[arg(long)]
    min_price: Option<Decimal>,

    /// Inclusive upper price bound
    #[arg(long)]
    max_price: Option<Decimal>,

    /// Listing page, 1-based
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Page size
    #[arg(long, default_value_t = 50)]
    limit: u32,
}

pub(crate) async fn run(ctx: &AppContext, command: CatalogCommand) -> Result<(), String> {
    match command.command {
        CatalogSubcommand::Search(args) => search(ctx, args).await,
        CatalogSubcommand::Categories => categories(ctx).await,
        CatalogSubcommand::Banners => banners(ctx).await,
    }
}

async fn search(ctx: &AppContext, args: SearchArgs) -> Result<(), String> {
    let filter = ProductFilter {
        name: args.query,
        category: args.category,
        min_price: args.min_price,
        max_price: args.max_price,
    };

    // Read paths degrade to an empty listing; they never fail the screen.
    let listing = match ctx.catalog.search(&filter, args.page, args.limit).await {
        Ok(listing) => listing,
        Err(error) => {
            warn!("product search failed: {error}");

            println!("no matching products");

            return Ok(());
        }
    };

    if listing.products.is_empty() {
        println!("no matching products");

        return Ok(());
    }

    for product in &listing.products {
        let key = product
            .key()
            .map_or_else(|| "—".to_string(), |key| key.to_string());
        let (price, expiry, stock) = product.lead_batch().map_or(
            (Decimal::ZERO, "—".to_string(), "—".to_string()),
            |batch| {
                (
                    batch.price,
                    batch
                        .expiry
                        .map_or_else(|| "—".to_string(), |at| at.to_string()),
                    batch
                        .stock
                        .map_or_else(|| "—".to_string(), |stock| stock.to_string()),
                )
            },
        );

        println!(
            "{key}  {}  {}  expires {expiry}  price {price}  stock {stock}",
            product.name,
            product.manufacturer.as_deref().unwrap_or("unknown"),
        );
    }

    println!(
        "page {} of {}",
        listing.meta.current_page, listing.meta.last_page
    );

    Ok(())
}

async fn categories(ctx: &AppContext) -> Result<(), String> {
    let categories = match ctx.catalog.categories().await {
        Ok(categories) => categories,
        Err(error) => {
            warn!("category listing failed: {error}");

            println!("no categories");

            return Ok(());
        }
    };

    if categories.is_empty() {
        println!("no categories");

        return Ok(());
    }

    for category in categories {
        println!("{}  {}", category.key, category.name);
    }

    Ok(())
}

async fn banners(ctx: &AppContext) -> Result<(), String> {
    let banners = match ctx.catalog.banners().await {
        Ok(banners) => banners,
        Err(error) => {
            warn!("banner listing failed: {error}");

            println!("no banners");

            return Ok(());
        }
    };

    if banners.is_empty() {
        println!("no banners");

        return Ok(());
    }

    for banner in banners {
        println!(
            "{}  {}",
            banner.image_url.as_deref().unwrap_or("—"),
            banner.link.as_deref().unwrap_or("—"),
        );
    }

    Ok(())
}
