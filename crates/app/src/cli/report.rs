use std::{fs, path::PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use jiff::civil::Date;

use apotheca_app::{api::models::ReportFormat, context::AppContext};

#[derive(Debug, Args)]
pub(crate) struct ReportCommand {
    #[command(subcommand)]
    command: ReportSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReportSubcommand {
    /// Aggregated sales report over a date range
    Range {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },

    /// Download one order's report
    Export {
        /// Order code
        #[arg(long)]
        code: String,

        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,

        /// Destination path; defaults to `order_<code>.<ext>`
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Pdf,
    Xlsx,
}

impl From<ExportFormat> for ReportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Pdf => Self::Pdf,
            ExportFormat::Xlsx => Self::Xlsx,
        }
    }
}

pub(crate) async fn run(ctx: &AppContext, command: ReportCommand) -> Result<(), String> {
    match command.command {
        ReportSubcommand::Range { from, to } => range(ctx, &from, &to).await,
        ReportSubcommand::Export {
            code,
            format,
            output,
        } => export(ctx, &code, format, output).await,
    }
}

fn parse_date(raw: &str) -> Result<Date, String> {
    raw.parse()
        .map_err(|error| format!("invalid date `{raw}` (expected YYYY-MM-DD): {error}"))
}

async fn range(ctx: &AppContext, from: &str, to: &str) -> Result<(), String> {
    let report = ctx
        .orders
        .sales_report(parse_date(from)?, parse_date(to)?)
        .await
        .map_err(|error| format!("report request failed: {error}"))?;

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| format!("failed to render report: {error}"))?;

    println!("{rendered}");

    Ok(())
}

async fn export(
    ctx: &AppContext,
    code: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let format = ReportFormat::from(format);
    let bytes = ctx
        .orders
        .export_report(code, format)
        .await
        .map_err(|error| format!("report download failed: {error}"))?;

    let path = output.unwrap_or_else(|| PathBuf::from(format!("order_{code}.{}", format.as_str())));

    fs::write(&path, bytes).map_err(|error| format!("failed to write {}: {error}", path.display()))?;

    println!("report saved to {}", path.display());

    Ok(())
}
