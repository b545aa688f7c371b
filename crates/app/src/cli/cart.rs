use apotheca::products::{Product, ProductKey};
use clap::{Args, Subcommand};

use apotheca_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Print the cart's lines and totals
    Show,

    /// Find a product by code and add it to the cart
    Add {
        /// Product identity (id, code, or article)
        #[arg(long)]
        code: String,

        /// Quantity to add
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },

    /// Remove a line from the cart
    Remove {
        /// Product identity of the line
        #[arg(long)]
        key: String,
    },

    /// Set a line's quantity directly
    SetQuantity {
        /// Product identity of the line
        #[arg(long)]
        key: String,

        /// New quantity (at least 1)
        #[arg(long)]
        quantity: u32,
    },

    /// Select which batch a line's price and stock come from
    SelectBatch {
        /// Product identity of the line
        #[arg(long)]
        key: String,

        /// Batch index in first-expiry-first-out order
        #[arg(long)]
        index: usize,
    },

    /// Empty the cart
    Clear,
}

/// Associates the cart with the signed-in user and hydrates it.
pub(crate) fn load_cart(ctx: &AppContext) -> Result<(), String> {
    let user_id = ctx
        .session
        .user_id()
        .ok_or_else(|| "not signed in (run `auth sign-in` first)".to_string())?;

    ctx.cart.load(&user_id);

    Ok(())
}

fn parse_key(raw: &str) -> Result<ProductKey, String> {
    ProductKey::new(raw).ok_or_else(|| "product key cannot be empty".to_string())
}

pub(crate) async fn run(ctx: &AppContext, command: CartCommand) -> Result<(), String> {
    load_cart(ctx)?;

    match command.command {
        CartSubcommand::Show => show(ctx),
        CartSubcommand::Add { code, quantity } => add(ctx, &code, quantity).await,
        CartSubcommand::Remove { key } => {
            ctx.cart
                .remove_from_cart(&parse_key(&key)?)
                .map_err(|error| error.to_string())?;

            show(ctx)
        }
        CartSubcommand::SetQuantity { key, quantity } => {
            ctx.cart
                .update_quantity(&parse_key(&key)?, quantity)
                .map_err(|error| error.to_string())?;

            show(ctx)
        }
        CartSubcommand::SelectBatch { key, index } => {
            ctx.cart
                .update_batch_index(&parse_key(&key)?, index)
                .map_err(|error| error.to_string())?;

            show(ctx)
        }
        CartSubcommand::Clear => {
            ctx.cart.clear_cart().map_err(|error| error.to_string())?;

            println!("cart cleared");

            Ok(())
        }
    }
}

fn show(ctx: &AppContext) -> Result<(), String> {
    let lines = ctx.cart.lines();

    if lines.is_empty() {
        println!("cart is empty");

        return Ok(());
    }

    for line in &lines {
        let expiry = line
            .expiry()
            .map_or_else(|| "—".to_string(), |at| at.to_string());
        let batches = line.batches().len();

        println!(
            "{}  {}  expires {expiry}  price {}  x{}  = {}  (batch {}/{batches})",
            line.key(),
            line.name,
            line.unit_price(),
            line.quantity(),
            line.line_total(),
            line.selected_batch_index() + 1,
        );
    }

    println!("items: {}   total: {}", ctx.cart.count(), ctx.cart.total());

    Ok(())
}

async fn add(ctx: &AppContext, code: &str, quantity: u32) -> Result<(), String> {
    let product = find_product(ctx, code)
        .await?
        .ok_or_else(|| format!("no product with code `{code}`"))?;
    let name = product.name.clone();

    ctx.cart
        .add_to_cart(product, quantity)
        .map_err(|error| error.to_string())?;

    println!("{name} added to cart");

    show(ctx)
}

/// Walks the listing pages until the code matches. Bounded by the listing's
/// own last page.
async fn find_product(ctx: &AppContext, code: &str) -> Result<Option<Product>, String> {
    let mut page = 1;

    loop {
        let listing = ctx
            .catalog
            .products_page(page, 100)
            .await
            .map_err(|error| format!("product lookup failed: {error}"))?;

        let found = listing
            .products
            .iter()
            .find(|product| product.key().is_some_and(|key| key.as_str() == code));

        if let Some(product) = found {
            return Ok(Some(product.clone()));
        }

        if !listing.meta.has_more() {
            return Ok(None);
        }

        page += 1;
    }
}
