//! Stock board views: most traded, top movers and per-exchange breadth.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use crate::error::WarrantLensError;
use crate::market::breadth;
use crate::types::*;

/// Rows returned by a ranking when no limit is given.
pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// Listed first in the exchange summary, in this order.
const MAIN_EXCHANGES: [&str; 3] = ["HOSE", "HNX", "UPCOM"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One stock row as delivered by the market-data provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    /// HOSE, HNX or UPCOM
    #[serde(default)]
    pub exchange: String,
    pub current_price: Money,
    #[serde(default)]
    pub change: Money,
    #[serde(default)]
    pub change_percent: Percent,
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub value: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockRanking {
    #[default]
    TopVolume,
    TopGainers,
    TopLosers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRankingInput {
    pub stocks: Vec<StockQuote>,
    #[serde(default)]
    pub ranking: StockRanking,
    /// Exchange name, case-insensitive
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStocks {
    /// Rows returned
    pub total: usize,
    pub stocks: Vec<StockQuote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSummary {
    pub exchange: String,
    pub total_stocks: usize,
    pub total_volume: u64,
    pub total_value: Money,
    pub advances: usize,
    pub declines: usize,
    pub unchanged: usize,
}

impl FromStr for StockRanking {
    type Err = WarrantLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "volume" | "topvolume" => Ok(StockRanking::TopVolume),
            "gainers" | "topgainers" => Ok(StockRanking::TopGainers),
            "losers" | "toplosers" => Ok(StockRanking::TopLosers),
            _ => Err(WarrantLensError::InvalidInput {
                field: "ranking".into(),
                reason: format!(
                    "Unknown ranking '{}'. Use: top_volume, top_gainers, top_losers",
                    s.trim()
                ),
            }),
        }
    }
}

impl fmt::Display for StockRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockRanking::TopVolume => write!(f, "top_volume"),
            StockRanking::TopGainers => write!(f, "top_gainers"),
            StockRanking::TopLosers => write!(f, "top_losers"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Rank the board by volume or session change. Ties keep board order.
pub fn rank_stocks(input: &StockRankingInput) -> ComputationOutput<RankedStocks> {
    let start = Instant::now();

    let mut stocks: Vec<StockQuote> = input
        .stocks
        .iter()
        .filter(|stock| match input.exchange.as_deref() {
            Some(exchange) => stock.exchange.eq_ignore_ascii_case(exchange.trim()),
            None => true,
        })
        .cloned()
        .collect();

    match input.ranking {
        StockRanking::TopVolume => stocks.sort_by(|a, b| b.volume.cmp(&a.volume)),
        StockRanking::TopGainers => stocks.sort_by(|a, b| b.change_percent.cmp(&a.change_percent)),
        StockRanking::TopLosers => stocks.sort_by(|a, b| a.change_percent.cmp(&b.change_percent)),
    }
    stocks.truncate(input.limit.unwrap_or(DEFAULT_RANKING_LIMIT));

    debug!(
        ranking = %input.ranking,
        board = input.stocks.len(),
        returned = stocks.len(),
        "ranked stocks"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Stock board ranking",
        &serde_json::json!({
            "ranking": input.ranking.to_string(),
            "exchange": input.exchange,
            "limit": input.limit.unwrap_or(DEFAULT_RANKING_LIMIT),
        }),
        Vec::new(),
        elapsed,
        RankedStocks {
            total: stocks.len(),
            stocks,
        },
    )
}

/// Totals and breadth per exchange: HOSE, HNX and UPCOM first, then any
/// other exchange alphabetically. Stocks without an exchange are skipped.
pub fn exchange_summary(stocks: &[StockQuote]) -> Vec<ExchangeSummary> {
    let mut groups: BTreeMap<String, Vec<&StockQuote>> = BTreeMap::new();
    for stock in stocks {
        let exchange = stock.exchange.trim().to_uppercase();
        if exchange.is_empty() {
            continue;
        }
        groups.entry(exchange).or_default().push(stock);
    }

    let mut summaries: Vec<ExchangeSummary> = groups
        .into_iter()
        .map(|(exchange, members)| {
            let (advances, declines, unchanged) = breadth(members.iter().map(|s| s.change_percent));
            ExchangeSummary {
                exchange,
                total_stocks: members.len(),
                total_volume: members.iter().map(|s| s.volume).sum(),
                total_value: members.iter().map(|s| s.value).sum(),
                advances,
                declines,
                unchanged,
            }
        })
        .collect();

    // stable: unlisted exchanges keep their alphabetical order
    summaries.sort_by_key(|summary| {
        MAIN_EXCHANGES
            .iter()
            .position(|main| *main == summary.exchange)
            .unwrap_or(MAIN_EXCHANGES.len())
    });
    summaries
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
