use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use tallybook::cli::report::ReportRequest;
use tallybook::core::log::init_logging;
use tallybook::core::{AmountPolicy, Granularity, TransactionFilter, WeekScheme};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ReportArgs {
    /// Period size: weekly, monthly, quarterly or annual
    #[arg(short, long)]
    granularity: Option<Granularity>,

    /// Weekly bucketing: month_relative or monday_aligned
    #[arg(long)]
    week_scheme: Option<WeekScheme>,

    /// Treatment of unreadable amounts: lenient or strict
    #[arg(long)]
    amount_policy: Option<AmountPolicy>,

    /// Records file, overriding the configured one
    #[arg(short, long)]
    records: Option<String>,

    /// Only include transactions whose details contain this text
    #[arg(short, long)]
    search: Option<String>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl From<ReportArgs> for ReportRequest {
    fn from(args: ReportArgs) -> ReportRequest {
        ReportRequest {
            granularity: args.granularity,
            week_scheme: args.week_scheme,
            amount_policy: args.amount_policy,
            records: args.records,
            filter: TransactionFilter {
                search: args.search,
                start: args.from,
                end: args.to,
            },
            json: args.json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display transactions grouped by period with running balances
    Report(ReportArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => tallybook::cli::setup::setup(),
        Some(Commands::Report(args)) => tallybook::run_command(
            tallybook::AppCommand::Report(args.into()),
            cli.config_path.as_deref(),
        ),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
