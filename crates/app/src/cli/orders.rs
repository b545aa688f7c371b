use std::sync::Arc;

use apotheca::status::{OrderStage, StageFlags, StageState};
use clap::{Args, Subcommand};
use tracing::warn;

use apotheca_app::{
    context::AppContext,
    orders::{OrderHistoryFilter, OrderTracker},
};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List past orders
    History(HistoryArgs),

    /// Print one order's stage progress
    Status {
        /// Order identifier
        #[arg(long)]
        order_id: String,
    },

    /// Follow one order's progress until delivery
    Watch {
        /// Order identifier
        #[arg(long)]
        order_id: String,
    },

    /// Confirm receipt of a delivered order
    Confirm {
        /// Order identifier
        #[arg(long)]
        order_id: String,
    },
}

#[derive(Debug, Args)]
struct HistoryArgs {
    /// Listing page, 1-based
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Page size
    #[arg(long, default_value_t = 10)]
    limit: u32,

    /// Restrict to orders with this status label
    #[arg(long)]
    status: Option<String>,

    /// Restrict to order codes containing this substring
    #[arg(long)]
    code: Option<String>,
}

pub(crate) async fn run(ctx: &AppContext, command: OrdersCommand) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::History(args) => history(ctx, args).await,
        OrdersSubcommand::Status { order_id } => status(ctx, &order_id).await,
        OrdersSubcommand::Watch { order_id } => watch(ctx, order_id).await,
        OrdersSubcommand::Confirm { order_id } => confirm(ctx, &order_id).await,
    }
}

async fn history(ctx: &AppContext, args: HistoryArgs) -> Result<(), String> {
    // Read paths degrade to an empty listing; they never fail the screen.
    let page = match ctx.orders.history(args.page, args.limit).await {
        Ok(page) => page,
        Err(error) => {
            warn!("order history failed: {error}");

            println!("no orders found");

            return Ok(());
        }
    };

    let filter = OrderHistoryFilter {
        status: args.status,
        code: args.code,
    };

    let matching: Vec<_> = page
        .orders
        .iter()
        .filter(|order| filter.matches(order))
        .collect();

    if matching.is_empty() {
        println!("no orders found");

        return Ok(());
    }

    for order in matching {
        println!(
            "#{}  {}  {}  total {}",
            order.code,
            order.status.as_deref().unwrap_or("unknown"),
            order
                .created_at
                .map_or_else(|| "—".to_string(), |at| at.to_string()),
            order.total(),
        );
    }

    let pages = page.total.div_ceil(u64::from(args.limit.max(1)));

    println!("page {} of {pages}", args.page);

    Ok(())
}

fn print_stages(flags: &StageFlags) {
    for stage in OrderStage::ALL {
        let marker = match flags.state_of(stage) {
            StageState::Reached => "[x]",
            StageState::Current => "[>]",
            StageState::Pending => "[ ]",
        };
        let at = flags
            .entry(stage)
            .at
            .map_or_else(|| "—".to_string(), |at| at.to_string());

        println!("{marker} {}  {at}", stage.label());
    }
}

async fn status(ctx: &AppContext, order_id: &str) -> Result<(), String> {
    let status = ctx
        .orders
        .order_status(order_id)
        .await
        .map_err(|error| format!("order status failed: {error}"))?;

    println!("order {}", status.order_id);
    print_stages(&status.flags);

    Ok(())
}

async fn watch(ctx: &AppContext, order_id: String) -> Result<(), String> {
    let tracker = OrderTracker::spawn(Arc::clone(&ctx.orders), order_id, ctx.poll_interval);
    let mut snapshots = tracker.subscribe();

    println!("watching order {}; press ctrl-c to stop", tracker.latest().order_id);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }

                let snapshot = snapshots.borrow_and_update().clone();

                println!("— {} —", snapshot.flags.current_stage());
                print_stages(&snapshot.flags);

                if snapshot.flags.is_delivered() {
                    println!("order delivered");

                    break;
                }
            }
        }
    }

    tracker.stop().await;

    Ok(())
}

async fn confirm(ctx: &AppContext, order_id: &str) -> Result<(), String> {
    let status = ctx
        .orders
        .order_status(order_id)
        .await
        .map_err(|error| format!("order status failed: {error}"))?;

    if !status.flags.can_confirm_receipt() {
        return Err(format!(
            "receipt can be confirmed only between '{}' and '{}'; order is at '{}'",
            OrderStage::ReadyForDelivery,
            OrderStage::InTransit,
            status.flags.current_stage(),
        ));
    }

    let receipt = ctx
        .orders
        .confirm_receipt(order_id)
        .await
        .map_err(|error| format!("receipt confirmation failed: {error}"))?;

    match receipt.delivered_at {
        Some(at) => println!("receipt confirmed, delivered at {at}"),
        None => println!("receipt confirmed"),
    }

    Ok(())
}
