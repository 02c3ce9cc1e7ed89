mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::market::{BoardArgs, ExchangeArgs, ListArgs, MoversArgs};
use commands::scenarios::ScenariosArgs;
use commands::screener::ScreenArgs;
use commands::trading::TradeArgs;
use commands::warrant::{
    BreakEvenArgs, DecomposeArgs, DetailArgs, PriceGridArgs, ProjectArgs, SymbolArgs,
};
use config::{FeeArgs, Settings};

/// Covered warrant break-even, screening and what-if analysis
#[derive(Parser)]
#[command(
    name = "wlens",
    version,
    about = "Covered warrant break-even, screening and what-if analysis",
    long_about = "A CLI for Vietnamese covered warrant and stock trade calculations \
                  with decimal precision. Supports fee-aware P/L, warrant break-even, \
                  intrinsic/time value, price projection, screening, scenario tables \
                  and board statistics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Settings file (YAML, or JSON by extension)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    fees: FeeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Fee- and tax-aware P/L of one buy/sell round trip
    Trade(TradeArgs),
    /// Underlying break-even price of a covered warrant
    BreakEven(BreakEvenArgs),
    /// Split a warrant price into intrinsic and time value
    Decompose(DecomposeArgs),
    /// Project a warrant price at a target underlying price
    Project(ProjectArgs),
    /// Projected warrant prices (and P/L) over a range of underlying targets
    PriceGrid(PriceGridArgs),
    /// Screen the warrants on one underlying against a target price
    Screen(ScreenArgs),
    /// What-if table of sell scenarios for a position
    Scenarios(ScenariosArgs),
    /// Break-even, value split and leverage of one warrant
    Detail(DetailArgs),
    /// Decode a covered warrant symbol
    Symbol(SymbolArgs),
    /// Filter and sort the warrant board
    List(ListArgs),
    /// Board-wide totals, breadth and groupings
    MarketStats(BoardArgs),
    /// Issuers ranked by listed warrants
    Issuers(BoardArgs),
    /// Stocks ranked by volume or session change
    Movers(MoversArgs),
    /// Totals and advances/declines per exchange
    Exchanges(ExchangeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let settings = Settings::load(cli.config.as_deref(), &cli.fees)?;

    match cli.command {
        Commands::Trade(args) => commands::trading::run_trade(args, &settings),
        Commands::BreakEven(args) => commands::warrant::run_break_even(args),
        Commands::Decompose(args) => commands::warrant::run_decompose(args, &settings),
        Commands::Project(args) => commands::warrant::run_project(args, &settings),
        Commands::PriceGrid(args) => commands::warrant::run_price_grid(args, &settings),
        Commands::Screen(args) => commands::screener::run_screen(args, &settings),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args, &settings),
        Commands::Detail(args) => commands::warrant::run_detail(args, &settings),
        Commands::Symbol(args) => commands::warrant::run_symbol(args),
        Commands::List(args) => commands::market::run_list(args),
        Commands::MarketStats(args) => commands::market::run_market_stats(args),
        Commands::Issuers(args) => commands::market::run_issuers(args),
        Commands::Movers(args) => commands::market::run_movers(args),
        Commands::Exchanges(args) => commands::market::run_exchanges(args),
        Commands::Version => Ok(serde_json::json!({
            "name": "wlens",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = cli.output.clone();

    match run(cli) {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
