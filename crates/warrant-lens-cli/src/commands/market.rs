use clap::Args;
use serde_json::Value;

use warrant_lens_core::market::{self, WarrantListingInput};
use warrant_lens_core::stocks::{self, StockQuote, StockRankingInput};
use warrant_lens_core::types::WarrantQuote;

use crate::input;

/// Arguments for the warrant board listing
#[derive(Args)]
pub struct ListArgs {
    /// Path to JSON/YAML with `warrants`, optional `underlying` quotes and `query`
    #[arg(long)]
    pub input: Option<String>,

    /// Only warrants on this underlying
    #[arg(long)]
    pub underlying: Option<String>,

    /// Issuer name contains
    #[arg(long)]
    pub issuer: Option<String>,

    /// Symbol or underlying contains
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub min_days: Option<i64>,

    #[arg(long)]
    pub max_days: Option<i64>,

    #[arg(long)]
    pub min_volume: Option<u64>,

    /// volume, change_percent, days_to_maturity, exercise_price, break_even, leverage
    #[arg(long)]
    pub sort_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    pub order: Option<String>,

    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for board-wide statistics and the issuer league
#[derive(Args)]
pub struct BoardArgs {
    /// Path to JSON/YAML: an array of warrant quotes or an object with `warrants`
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the stock rankings
#[derive(Args)]
pub struct MoversArgs {
    /// Path to JSON/YAML: an array of stock quotes or an object with `stocks`
    #[arg(long)]
    pub input: Option<String>,

    /// top_volume, top_gainers or top_losers
    #[arg(long, default_value = "top_volume")]
    pub ranking: String,

    /// Only stocks listed on this exchange
    #[arg(long)]
    pub exchange: Option<String>,

    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the per-exchange summary
#[derive(Args)]
pub struct ExchangeArgs {
    /// Path to JSON/YAML: an array of stock quotes or an object with `stocks`
    #[arg(long)]
    pub input: Option<String>,
}

/// Read a bare array of quotes or the array under `key`.
fn read_quotes<T: serde::de::DeserializeOwned>(
    path: Option<&str>,
    key: &str,
) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let value = input::read_value(path)?.ok_or("--input <file> or stdin required")?;
    let quotes = match value {
        Value::Object(mut map) => map
            .remove(key)
            .ok_or_else(|| format!("input object has no `{}` array", key))?,
        other => other,
    };
    Ok(serde_json::from_value(quotes)?)
}

fn read_board(path: Option<&str>) -> Result<Vec<WarrantQuote>, Box<dyn std::error::Error>> {
    read_quotes(path, "warrants")
}

pub fn run_list(args: ListArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = input::read_value(args.input.as_deref())?
        .ok_or("--input <file> or stdin required for the listing")?;
    // a bare array is the board with no query
    let mut listing_input: WarrantListingInput = if value.is_array() {
        WarrantListingInput {
            warrants: serde_json::from_value(value)?,
            underlying: Vec::new(),
            query: Default::default(),
        }
    } else {
        serde_json::from_value(value)?
    };

    let query = &mut listing_input.query;
    if args.underlying.is_some() {
        query.underlying = args.underlying;
    }
    if args.issuer.is_some() {
        query.issuer = args.issuer;
    }
    if args.search.is_some() {
        query.search = args.search;
    }
    if args.min_days.is_some() {
        query.min_days = args.min_days;
    }
    if args.max_days.is_some() {
        query.max_days = args.max_days;
    }
    if args.min_volume.is_some() {
        query.min_volume = args.min_volume;
    }
    if let Some(ref key) = args.sort_by {
        query.sort_by = Some(key.parse()?);
    }
    if let Some(ref order) = args.order {
        query.sort_order = order.parse()?;
    }
    if args.limit.is_some() {
        query.limit = args.limit;
    }

    Ok(serde_json::to_value(market::list_warrants(&listing_input))?)
}

pub fn run_market_stats(args: BoardArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let board = read_board(args.input.as_deref())?;
    Ok(serde_json::to_value(market::market_statistics(&board))?)
}

pub fn run_issuers(args: BoardArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let board = read_board(args.input.as_deref())?;
    Ok(serde_json::to_value(market::issuer_league(&board))?)
}

pub fn run_movers(args: MoversArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stocks: Vec<StockQuote> = read_quotes(args.input.as_deref(), "stocks")?;
    let ranking_input = StockRankingInput {
        stocks,
        ranking: args.ranking.parse()?,
        exchange: args.exchange,
        limit: args.limit,
    };
    Ok(serde_json::to_value(stocks::rank_stocks(&ranking_input))?)
}

pub fn run_exchanges(args: ExchangeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stocks: Vec<StockQuote> = read_quotes(args.input.as_deref(), "stocks")?;
    Ok(serde_json::to_value(stocks::exchange_summary(&stocks))?)
}
