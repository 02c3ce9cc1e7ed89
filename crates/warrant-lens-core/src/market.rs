//! Warrant board listing, filtering and market statistics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use crate::error::WarrantLensError;
use crate::screener::expiry_order;
use crate::types::*;
use crate::warrant::{break_even, valuation};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSortKey {
    Volume,
    ChangePercent,
    DaysToMaturity,
    ExercisePrice,
    BreakEven,
    Leverage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarrantQuery {
    /// Exact underlying ticker, case-insensitive
    #[serde(default)]
    pub underlying: Option<String>,
    /// Substring of the issuer name, case-insensitive
    #[serde(default)]
    pub issuer: Option<String>,
    /// Substring of the warrant or underlying symbol
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_days: Option<i64>,
    #[serde(default)]
    pub max_days: Option<i64>,
    #[serde(default)]
    pub min_volume: Option<u64>,
    #[serde(default)]
    pub sort_by: Option<ListingSortKey>,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Applied after the total is counted
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantListingInput {
    pub warrants: Vec<WarrantQuote>,
    /// Quotes for the underlyings, used for leverage
    #[serde(default)]
    pub underlying: Vec<UnderlyingQuote>,
    #[serde(default)]
    pub query: WarrantQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedWarrant {
    #[serde(flatten)]
    pub quote: WarrantQuote,
    pub break_even_price: Money,
    pub leverage: Ratio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantListing {
    /// Matches before the limit was applied
    pub total: usize,
    pub warrants: Vec<ListedWarrant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub volume: u64,
    pub value: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantMarketStats {
    pub total_warrants: usize,
    pub total_underlying: usize,
    pub total_volume: u64,
    pub total_value: Money,
    pub advances: usize,
    pub declines: usize,
    pub unchanged: usize,
    pub by_underlying: BTreeMap<String, GroupStats>,
    pub by_issuer: BTreeMap<String, GroupStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerCount {
    pub name: String,
    pub warrant_count: usize,
}

impl FromStr for ListingSortKey {
    type Err = WarrantLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "volume" => Ok(ListingSortKey::Volume),
            "changepercent" | "change" => Ok(ListingSortKey::ChangePercent),
            "daystomaturity" | "days" => Ok(ListingSortKey::DaysToMaturity),
            "exerciseprice" => Ok(ListingSortKey::ExercisePrice),
            "breakeven" => Ok(ListingSortKey::BreakEven),
            "leverage" => Ok(ListingSortKey::Leverage),
            _ => Err(WarrantLensError::InvalidInput {
                field: "sort_by".into(),
                reason: format!(
                    "Unknown sort key '{}'. Use: volume, change_percent, days_to_maturity, \
                     exercise_price, break_even, leverage",
                    s.trim()
                ),
            }),
        }
    }
}

impl FromStr for SortOrder {
    type Err = WarrantLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(WarrantLensError::InvalidInput {
                field: "sort_order".into(),
                reason: format!("Unknown sort order '{other}'. Use: asc, desc"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

impl WarrantQuery {
    pub fn matches(&self, quote: &WarrantQuote) -> bool {
        if let Some(underlying) = &self.underlying {
            if !quote.underlying_symbol.eq_ignore_ascii_case(underlying.trim()) {
                return false;
            }
        }
        if let Some(issuer) = &self.issuer {
            if !quote
                .issuer_name
                .to_uppercase()
                .contains(&issuer.trim().to_uppercase())
            {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_uppercase();
            if !quote.symbol.to_uppercase().contains(&needle)
                && !quote.underlying_symbol.to_uppercase().contains(&needle)
            {
                return false;
            }
        }
        // Any maturity bound excludes warrants whose maturity is unknown.
        if self.min_days.is_some() || self.max_days.is_some() {
            if quote.days_to_maturity < 0 {
                return false;
            }
            if self.min_days.is_some_and(|min| quote.days_to_maturity < min) {
                return false;
            }
            if self.max_days.is_some_and(|max| quote.days_to_maturity > max) {
                return false;
            }
        }
        if self.min_volume.is_some_and(|min| quote.volume < min) {
            return false;
        }
        true
    }
}

fn compare_listed(a: &ListedWarrant, b: &ListedWarrant, key: ListingSortKey) -> Ordering {
    match key {
        ListingSortKey::Volume => a.quote.volume.cmp(&b.quote.volume),
        ListingSortKey::ChangePercent => a.quote.change_percent.cmp(&b.quote.change_percent),
        ListingSortKey::DaysToMaturity => a.quote.days_to_maturity.cmp(&b.quote.days_to_maturity),
        ListingSortKey::ExercisePrice => a.quote.exercise_price.cmp(&b.quote.exercise_price),
        ListingSortKey::BreakEven => a.break_even_price.cmp(&b.break_even_price),
        ListingSortKey::Leverage => a.leverage.cmp(&b.leverage),
    }
}

fn sort_listing(warrants: &mut [ListedWarrant], key: ListingSortKey, order: SortOrder) {
    if key == ListingSortKey::DaysToMaturity {
        // unknown maturities trail in both directions
        warrants.sort_by(|a, b| {
            let (x, y) = (a.quote.days_to_maturity, b.quote.days_to_maturity);
            match order {
                SortOrder::Asc => expiry_order(x, y),
                SortOrder::Desc => (x < 0).cmp(&(y < 0)).then(y.cmp(&x)),
            }
        });
        return;
    }
    match order {
        SortOrder::Asc => warrants.sort_by(|a, b| compare_listed(a, b, key)),
        SortOrder::Desc => warrants.sort_by(|a, b| compare_listed(b, a, key)),
    }
}

pub fn list_warrants(input: &WarrantListingInput) -> ComputationOutput<WarrantListing> {
    let start = Instant::now();
    let query = &input.query;

    let underlying_prices: HashMap<String, Money> = input
        .underlying
        .iter()
        .map(|u| (u.symbol.to_uppercase(), u.current_price))
        .collect();

    let mut warrants: Vec<ListedWarrant> = input
        .warrants
        .iter()
        .filter(|q| query.matches(q))
        .map(|q| {
            let underlying_price = underlying_prices
                .get(&q.underlying_symbol.to_uppercase())
                .copied()
                .unwrap_or(Decimal::ZERO);
            ListedWarrant {
                quote: q.clone(),
                break_even_price: break_even::break_even_price(
                    q.current_price,
                    q.conversion_ratio,
                    q.exercise_price,
                ),
                leverage: valuation::leverage(underlying_price, q.current_price, q.conversion_ratio),
            }
        })
        .collect();

    if let Some(key) = query.sort_by {
        sort_listing(&mut warrants, key, query.sort_order);
    }

    let total = warrants.len();
    if let Some(limit) = query.limit.filter(|l| *l > 0) {
        warrants.truncate(limit);
    }

    debug!(
        total_quotes = input.warrants.len(),
        matched = total,
        returned = warrants.len(),
        "listed warrants"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Warrant board listing",
        query,
        Vec::new(),
        elapsed,
        WarrantListing { total, warrants },
    )
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Advancing, declining and unchanged counts of a set of session changes.
pub fn breadth(changes: impl IntoIterator<Item = Percent>) -> (usize, usize, usize) {
    changes
        .into_iter()
        .fold((0, 0, 0), |(up, down, flat), change| match change.cmp(&Decimal::ZERO) {
            Ordering::Greater => (up + 1, down, flat),
            Ordering::Less => (up, down + 1, flat),
            Ordering::Equal => (up, down, flat + 1),
        })
}

/// Blank keys (an unpublished underlying or issuer) form no group.
fn add_to_group(groups: &mut BTreeMap<String, GroupStats>, key: &str, quote: &WarrantQuote) {
    if key.trim().is_empty() {
        return;
    }
    let group = groups.entry(key.to_string()).or_default();
    group.count += 1;
    group.volume += quote.volume;
    group.value += quote.value;
}

pub fn market_statistics(warrants: &[WarrantQuote]) -> ComputationOutput<WarrantMarketStats> {
    let start = Instant::now();

    let mut by_underlying: BTreeMap<String, GroupStats> = BTreeMap::new();
    let mut by_issuer: BTreeMap<String, GroupStats> = BTreeMap::new();
    for quote in warrants {
        add_to_group(&mut by_underlying, &quote.underlying_symbol, quote);
        add_to_group(&mut by_issuer, &quote.issuer_name, quote);
    }
    let underlyings: BTreeSet<&str> = warrants
        .iter()
        .map(|w| w.underlying_symbol.trim())
        .filter(|symbol| !symbol.is_empty())
        .collect();

    let (advances, declines, unchanged) = breadth(warrants.iter().map(|w| w.change_percent));

    let output = WarrantMarketStats {
        total_warrants: warrants.len(),
        total_underlying: underlyings.len(),
        total_volume: warrants.iter().map(|w| w.volume).sum(),
        total_value: warrants.iter().map(|w| w.value).sum(),
        advances,
        declines,
        unchanged,
        by_underlying,
        by_issuer,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Covered warrant market statistics",
        &serde_json::json!({ "warrants": warrants.len() }),
        Vec::new(),
        elapsed,
        output,
    )
}

/// Issuers ranked by number of listed warrants, ties alphabetical.
pub fn issuer_league(warrants: &[WarrantQuote]) -> Vec<IssuerCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for quote in warrants.iter().filter(|w| !w.issuer_name.trim().is_empty()) {
        *counts.entry(quote.issuer_name.as_str()).or_insert(0) += 1;
    }
    let mut league: Vec<IssuerCount> = counts
        .into_iter()
        .map(|(name, warrant_count)| IssuerCount {
            name: name.to_string(),
            warrant_count,
        })
        .collect();
    league.sort_by(|a, b| b.warrant_count.cmp(&a.warrant_count));
    league
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
