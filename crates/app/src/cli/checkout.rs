use clap::Args;

use apotheca_app::{
    api::models::StockAdjustment,
    context::AppContext,
    orders::{LineConflict, OrdersServiceError},
};

use crate::cli::cart::load_cart;

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// On a stock conflict, adopt the server-reported quantities and
    /// resubmit once instead of leaving the cart for manual adjustment
    #[arg(long)]
    accept_adjustments: bool,
}

pub(crate) async fn run(ctx: &AppContext, args: CheckoutArgs) -> Result<(), String> {
    load_cart(ctx)?;

    let lines = ctx.cart.lines();

    match ctx.orders.submit_order(&lines).await {
        Ok(accepted) => finish(ctx, accepted.code.as_deref()),
        Err(OrdersServiceError::StockConflict(conflicts)) => {
            print_conflicts(&conflicts);

            if !args.accept_adjustments {
                return Err(
                    "insufficient stock; adjust the cart (or rerun with --accept-adjustments) \
                     and submit again"
                        .to_string(),
                );
            }

            let adjustments: Vec<StockAdjustment> = conflicts
                .iter()
                .map(|conflict| StockAdjustment {
                    product_code: conflict.product_code.clone(),
                    available: conflict.available,
                })
                .collect();

            ctx.cart
                .apply_stock_adjustments(&adjustments)
                .map_err(|error| error.to_string())?;

            let adjusted = ctx.cart.lines();

            if adjusted.is_empty() {
                return Err("nothing left to submit after adjustments".to_string());
            }

            println!("resubmitting with adjusted quantities");

            let accepted = ctx
                .orders
                .submit_order(&adjusted)
                .await
                .map_err(|error| format!("order not submitted: {error}"))?;

            finish(ctx, accepted.code.as_deref())
        }
        Err(error) => Err(format!("order not submitted: {error}")),
    }
}

fn finish(ctx: &AppContext, code: Option<&str>) -> Result<(), String> {
    // The cart clears only on a successful submission.
    ctx.cart.clear_cart().map_err(|error| error.to_string())?;

    match code {
        Some(code) => println!("order {code} submitted"),
        None => println!("order submitted"),
    }

    Ok(())
}

fn print_conflicts(conflicts: &[LineConflict]) {
    println!("some lines exceed available stock:");

    for conflict in conflicts {
        let name = conflict.name.as_deref().unwrap_or(&conflict.product_code);

        if conflict.available == 0 {
            println!("  {name}: out of stock (requested {})", conflict.requested);
        } else {
            println!(
                "  {name}: requested {}, available {}",
                conflict.requested, conflict.available
            );
        }
    }
}
