use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::WarrantLensError;
use crate::fees;
use crate::pnl;
use crate::types::*;
use crate::warrant::{break_even, maturity, projection, valuation};

/// Standard board lot on HOSE.
pub const DEFAULT_LOT_SIZE: u64 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenerFilter {
    #[default]
    All,
    Profitable,
    Unprofitable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Lexicographic ascending
    #[default]
    Symbol,
    /// Ascending
    BreakEven,
    /// Profit margin percent, descending
    Margin,
    /// Days to maturity ascending, unknown last
    Expiry,
    /// Descending
    Volume,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerInput {
    pub warrants: Vec<WarrantQuote>,
    pub underlying_price: Money,
    pub target_price: Money,
    #[serde(default)]
    pub fees: FeeSettings,
    #[serde(default = "default_quantity")]
    pub quantity: u64,
    #[serde(default)]
    pub filter: ScreenerFilter,
    #[serde(default)]
    pub sort_key: SortKey,
    #[serde(default)]
    pub near_expiration_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantScreenerRow {
    pub symbol: String,
    pub issuer_name: String,
    pub current_price: Money,
    pub exercise_price: Money,
    pub conversion_ratio: Ratio,
    pub days_to_maturity: i64,
    pub volume: u64,
    pub break_even_price: Money,
    /// Target strictly above break-even
    pub is_profitable: bool,
    pub profit_margin: Money,
    pub profit_margin_percent: Percent,
    pub intrinsic_value: Money,
    pub time_value: Money,
    pub is_in_the_money: bool,
    /// Projected warrant price at the target
    pub estimated_price: Money,
    pub total_cost: Money,
    pub net_revenue: Money,
    pub estimated_profit: Money,
    pub estimated_profit_percent: Percent,
    pub leverage: Ratio,
    pub is_near_expiration: bool,
    /// False when the ratio or exercise price is still missing
    pub data_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerOutput {
    pub total_warrants: usize,
    pub matched: usize,
    pub profitable_count: usize,
    pub rows: Vec<WarrantScreenerRow>,
}

fn default_quantity() -> u64 {
    DEFAULT_LOT_SIZE
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl FromStr for ScreenerFilter {
    type Err = WarrantLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ScreenerFilter::All),
            "profitable" => Ok(ScreenerFilter::Profitable),
            "unprofitable" => Ok(ScreenerFilter::Unprofitable),
            other => Err(WarrantLensError::InvalidInput {
                field: "filter".into(),
                reason: format!("Unknown filter '{other}'. Use: all, profitable, unprofitable"),
            }),
        }
    }
}

impl fmt::Display for ScreenerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenerFilter::All => write!(f, "all"),
            ScreenerFilter::Profitable => write!(f, "profitable"),
            ScreenerFilter::Unprofitable => write!(f, "unprofitable"),
        }
    }
}

impl FromStr for SortKey {
    type Err = WarrantLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "symbol" => Ok(SortKey::Symbol),
            "breakeven" => Ok(SortKey::BreakEven),
            "margin" => Ok(SortKey::Margin),
            "expiry" => Ok(SortKey::Expiry),
            "volume" => Ok(SortKey::Volume),
            _ => Err(WarrantLensError::InvalidInput {
                field: "sort_key".into(),
                reason: format!(
                    "Unknown sort key '{}'. Use: symbol, break_even, margin, expiry, volume",
                    s.trim()
                ),
            }),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Symbol => write!(f, "symbol"),
            SortKey::BreakEven => write!(f, "break_even"),
            SortKey::Margin => write!(f, "margin"),
            SortKey::Expiry => write!(f, "expiry"),
            SortKey::Volume => write!(f, "volume"),
        }
    }
}

impl ScreenerFilter {
    pub fn keeps(&self, row: &WarrantScreenerRow) -> bool {
        match self {
            ScreenerFilter::All => true,
            ScreenerFilter::Profitable => row.estimated_profit > Decimal::ZERO,
            ScreenerFilter::Unprofitable => row.estimated_profit <= Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Evaluate one warrant against a target underlying price.
pub fn screen_row(
    quote: &WarrantQuote,
    underlying_price: Money,
    target_price: Money,
    fee_settings: &FeeSettings,
    quantity: u64,
    near_expiration_days: i64,
) -> WarrantScreenerRow {
    let terms = quote.terms();
    let break_even = break_even::calculate_break_even(&break_even::BreakEvenInput {
        warrant_price: terms.current_price,
        conversion_ratio: terms.conversion_ratio,
        exercise_price: terms.exercise_price,
        target_underlying_price: Some(target_price),
    });
    let projected = projection::project_terms(&terms, underlying_price, target_price);

    let cost = fees::calculate_cost(terms.current_price, quantity, fee_settings.buy_fee_percent);
    let revenue = fees::calculate_revenue(
        projected.estimated_price,
        quantity,
        fee_settings.sell_fee_percent,
        fee_settings.sell_tax_percent,
    );
    let trade = pnl::combine(cost, revenue);

    WarrantScreenerRow {
        symbol: quote.symbol.clone(),
        issuer_name: quote.issuer_name.clone(),
        current_price: terms.current_price,
        exercise_price: terms.exercise_price,
        conversion_ratio: terms.conversion_ratio,
        days_to_maturity: terms.days_to_maturity,
        volume: quote.volume,
        break_even_price: break_even.break_even_price,
        is_profitable: break_even.is_profitable,
        profit_margin: break_even.profit_margin,
        profit_margin_percent: break_even.profit_margin_percent,
        intrinsic_value: projected.current_intrinsic_value,
        time_value: projected.current_time_value,
        is_in_the_money: valuation::is_in_the_money(underlying_price, terms.exercise_price),
        estimated_price: projected.estimated_price,
        total_cost: trade.cost.total_cost,
        net_revenue: trade.revenue.net_revenue,
        estimated_profit: trade.profit,
        estimated_profit_percent: trade.profit_percent,
        leverage: valuation::leverage(underlying_price, terms.current_price, terms.conversion_ratio),
        is_near_expiration: maturity::is_near_expiration(terms.days_to_maturity, near_expiration_days),
        data_available: terms.has_terms(),
    }
}

/// Ascending by days to maturity with unknown (negative) maturities last.
pub fn expiry_order(a: i64, b: i64) -> Ordering {
    (a < 0).cmp(&(b < 0)).then(a.cmp(&b))
}

/// Stable sort; ties keep their input order.
pub fn sort_rows(rows: &mut [WarrantScreenerRow], key: SortKey) {
    match key {
        SortKey::Symbol => rows.sort_by(|a, b| a.symbol.cmp(&b.symbol)),
        SortKey::BreakEven => rows.sort_by(|a, b| a.break_even_price.cmp(&b.break_even_price)),
        SortKey::Margin => {
            rows.sort_by(|a, b| b.profit_margin_percent.cmp(&a.profit_margin_percent))
        }
        SortKey::Expiry => rows.sort_by(|a, b| expiry_order(a.days_to_maturity, b.days_to_maturity)),
        SortKey::Volume => rows.sort_by(|a, b| b.volume.cmp(&a.volume)),
    }
}

pub fn screen_warrants(input: &ScreenerInput) -> ComputationOutput<ScreenerOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let near_days = input
        .near_expiration_days
        .unwrap_or(maturity::NEAR_EXPIRATION_DAYS);

    let mut rows: Vec<WarrantScreenerRow> = input
        .warrants
        .iter()
        .map(|quote| {
            screen_row(
                quote,
                input.underlying_price,
                input.target_price,
                &input.fees,
                input.quantity,
                near_days,
            )
        })
        .collect();

    for row in rows.iter().filter(|r| !r.data_available) {
        warn!(symbol = %row.symbol, "warrant terms not yet available");
        warnings.push(format!(
            "{}: conversion ratio or exercise price not yet available",
            row.symbol
        ));
    }

    let profitable_count = rows.iter().filter(|r| r.estimated_profit > Decimal::ZERO).count();
    rows.retain(|row| input.filter.keeps(row));
    sort_rows(&mut rows, input.sort_key);

    debug!(
        total = input.warrants.len(),
        matched = rows.len(),
        filter = %input.filter,
        sort_key = %input.sort_key,
        "screened warrants"
    );

    let output = ScreenerOutput {
        total_warrants: input.warrants.len(),
        matched: rows.len(),
        profitable_count,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Warrant screener (break-even, projected price, leverage)",
        &serde_json::json!({
            "underlying_price": input.underlying_price.to_string(),
            "target_price": input.target_price.to_string(),
            "quantity": input.quantity,
            "filter": input.filter.to_string(),
            "sort_key": input.sort_key.to_string(),
            "fees": input.fees,
        }),
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(symbol: &str, price: Money, exercise: Money, ratio: Ratio, days: i64, volume: u64) -> WarrantQuote {
        WarrantQuote {
            symbol: symbol.into(),
            underlying_symbol: "HPG".into(),
            issuer_name: "SSI".into(),
            current_price: price,
            exercise_price: exercise,
            conversion_ratio: ratio,
            days_to_maturity: days,
            volume,
            value: Decimal::ZERO,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
        }
    }

    fn input(warrants: Vec<WarrantQuote>) -> ScreenerInput {
        ScreenerInput {
            warrants,
            underlying_price: dec!(50000),
            target_price: dec!(53000),
            fees: FeeSettings::default(),
            quantity: 1000,
            filter: ScreenerFilter::All,
            sort_key: SortKey::Symbol,
            near_expiration_days: None,
        }
    }

    #[test]
    fn test_row_matches_reference_projection() {
        let row = screen_row(
            &quote("CHPG2505", dec!(1800), dec!(45000), dec!(4), 20, 0),
            dec!(50000),
            dec!(53000),
            &FeeSettings::default(),
            1000,
            maturity::NEAR_EXPIRATION_DAYS,
        );
        assert_eq!(row.break_even_price, dec!(52200));
        assert!(row.is_profitable);
        assert_eq!(row.profit_margin, dec!(800));
        assert_eq!(row.estimated_price, dec!(2440));
        assert_eq!(row.intrinsic_value, dec!(1250));
        assert_eq!(row.time_value, dec!(550));
        assert!(row.estimated_profit > Decimal::ZERO);
        assert!(row.data_available);
        assert!(row.is_near_expiration);
    }

    #[test]
    fn test_profitable_filter_and_complement() {
        let warrants = vec![
            quote("CHPG2505", dec!(1800), dec!(45000), dec!(4), 20, 0),
            // deep out of the money with little time: loses at the target
            quote("CHPG2510", dec!(900), dec!(60000), dec!(5), 5, 0),
        ];
        let mut screener = input(warrants);

        screener.filter = ScreenerFilter::Profitable;
        let profitable = screen_warrants(&screener).result;
        assert_eq!(profitable.matched, 1);
        assert_eq!(profitable.rows[0].symbol, "CHPG2505");
        assert_eq!(profitable.profitable_count, 1);

        screener.filter = ScreenerFilter::Unprofitable;
        let unprofitable = screen_warrants(&screener).result;
        assert_eq!(unprofitable.matched, 1);
        assert_eq!(unprofitable.rows[0].symbol, "CHPG2510");
        assert_eq!(unprofitable.total_warrants, 2);
    }

    #[test]
    fn test_expiry_sort_places_unknown_last() {
        let warrants = vec![
            quote("CA", dec!(1000), dec!(45000), dec!(4), -1, 0),
            quote("CB", dec!(1000), dec!(45000), dec!(4), 5, 0),
            quote("CC", dec!(1000), dec!(45000), dec!(4), 20, 0),
            quote("CD", dec!(1000), dec!(45000), dec!(4), 40, 0),
        ];
        let mut screener = input(warrants);
        screener.sort_key = SortKey::Expiry;
        let days: Vec<i64> = screen_warrants(&screener)
            .result
            .rows
            .iter()
            .map(|r| r.days_to_maturity)
            .collect();
        assert_eq!(days, vec![5, 20, 40, -1]);
    }

    #[test]
    fn test_volume_sort_is_stable_descending() {
        let warrants = vec![
            quote("CA", dec!(1000), dec!(45000), dec!(4), 40, 10),
            quote("CB", dec!(1000), dec!(45000), dec!(4), 40, 500),
            quote("CC", dec!(1000), dec!(45000), dec!(4), 40, 10),
        ];
        let mut screener = input(warrants);
        screener.sort_key = SortKey::Volume;
        let symbols: Vec<String> = screen_warrants(&screener)
            .result
            .rows
            .into_iter()
            .map(|r| r.symbol)
            .collect();
        assert_eq!(symbols, vec!["CB", "CA", "CC"]);
    }

    #[test]
    fn test_missing_terms_flagged_not_failed() {
        let warrants = vec![quote("CVNM2501", dec!(700), Decimal::ZERO, Decimal::ZERO, -1, 0)];
        let output = screen_warrants(&input(warrants));
        let row = &output.result.rows[0];
        assert!(!row.data_available);
        assert_eq!(row.leverage, Decimal::ZERO);
        assert_eq!(row.intrinsic_value, Decimal::ZERO);
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_input_untouched_by_pipeline() {
        let warrants = vec![
            quote("CB", dec!(1000), dec!(45000), dec!(4), 40, 10),
            quote("CA", dec!(1000), dec!(45000), dec!(4), 40, 500),
        ];
        let screener = input(warrants.clone());
        let _ = screen_warrants(&screener);
        assert_eq!(screener.warrants, warrants);
    }

    /// Target equal to the spot, no fees and a long maturity: each warrant
    /// projects to max(price, intrinsic), so a fairly priced one nets exactly 0.
    fn flat_market(warrants: Vec<WarrantQuote>) -> ScreenerInput {
        ScreenerInput {
            target_price: dec!(50000),
            fees: FeeSettings {
                buy_fee_percent: Decimal::ZERO,
                sell_fee_percent: Decimal::ZERO,
                sell_tax_percent: Decimal::ZERO,
            },
            quantity: 100,
            ..input(warrants)
        }
    }

    fn symbols(screener: &ScreenerInput) -> Vec<String> {
        screen_warrants(screener)
            .result
            .rows
            .into_iter()
            .map(|r| r.symbol)
            .collect()
    }

    #[test]
    fn test_zero_profit_is_not_profitable() {
        let warrants = vec![
            // intrinsic 1,250 + time value 550: projects back to 1,800
            quote("CZZZ2501", dec!(1800), dec!(45000), dec!(4), 60, 0),
            // trades below intrinsic: projects to 1,250
            quote("CAAA2501", dec!(500), dec!(45000), dec!(4), 60, 0),
        ];
        let mut screener = flat_market(warrants);

        let all = screen_warrants(&screener).result;
        let profits: Vec<Money> = all.rows.iter().map(|r| r.estimated_profit).collect();
        assert_eq!(profits, vec![dec!(75000), Decimal::ZERO]);
        assert_eq!(all.profitable_count, 1);

        screener.filter = ScreenerFilter::Profitable;
        assert_eq!(symbols(&screener), vec!["CAAA2501"]);

        screener.filter = ScreenerFilter::Unprofitable;
        assert_eq!(symbols(&screener), vec!["CZZZ2501"]);
    }

    #[test]
    fn test_symbol_sort_on_reversed_input() {
        let warrants = vec![
            quote("CVNM2503", dec!(1000), dec!(45000), dec!(4), 40, 0),
            quote("CMWG2502", dec!(1000), dec!(45000), dec!(4), 40, 0),
            quote("CHPG2501", dec!(1000), dec!(45000), dec!(4), 40, 0),
        ];
        assert_eq!(symbols(&input(warrants)), vec!["CHPG2501", "CMWG2502", "CVNM2503"]);
    }

    #[test]
    fn test_break_even_sort_is_stable_ascending() {
        let warrants = vec![
            // 1,800 * 4 + 45,000 = 52,200
            quote("CZZZ2501", dec!(1800), dec!(45000), dec!(4), 60, 0),
            // 500 * 4 + 45,000 = 47,000
            quote("CAAA2501", dec!(500), dec!(45000), dec!(4), 60, 0),
            // 1,200 * 6 + 45,000 = 52,200, ties with CZZZ2501
            quote("CMMM2501", dec!(1200), dec!(45000), dec!(6), 60, 0),
        ];
        let mut screener = flat_market(warrants);
        screener.sort_key = SortKey::BreakEven;
        let rows = screen_warrants(&screener).result.rows;
        let order: Vec<(&str, Money)> = rows
            .iter()
            .map(|r| (r.symbol.as_str(), r.break_even_price))
            .collect();
        assert_eq!(
            order,
            vec![
                ("CAAA2501", dec!(47000)),
                ("CZZZ2501", dec!(52200)),
                ("CMMM2501", dec!(52200)),
            ]
        );
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!("breakEven".parse::<SortKey>().unwrap(), SortKey::BreakEven);
        assert_eq!("break-even".parse::<SortKey>().unwrap(), SortKey::BreakEven);
        assert_eq!("PROFITABLE".parse::<ScreenerFilter>().unwrap(), ScreenerFilter::Profitable);
        assert!("leverage".parse::<SortKey>().is_err());
        assert!("some".parse::<ScreenerFilter>().is_err());
    }
}
