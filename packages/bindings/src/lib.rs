use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use warrant_lens_core::types::{Money, Percent, WarrantQuote};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Run a calculation, turning a decimal overflow panic into a JS error.
fn guarded<T>(calculation: impl FnOnce() -> T) -> NapiResult<T> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(calculation)).map_err(|_| {
        napi::Error::from_reason("Calculation overflowed the supported decimal range")
    })
}

fn parse_date(raw: &str) -> NapiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Trade P/L
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_trade(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::pnl::TradeInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        guarded(|| warrant_lens_core::pnl::try_evaluate_trade(&input))?.map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct StockBreakEvenInput {
    total_cost: Money,
    quantity: u64,
    sell_fee_percent: Percent,
    tax_percent: Percent,
}

#[napi]
pub fn stock_break_even(input_json: String) -> NapiResult<String> {
    let input: StockBreakEvenInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let price: Decimal = guarded(|| {
        warrant_lens_core::pnl::break_even_sell_price(
            input.total_cost,
            input.quantity,
            input.sell_fee_percent,
            input.tax_percent,
        )
    })?;
    Ok(price.to_string())
}

// ---------------------------------------------------------------------------
// Warrant analytics
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_break_even(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::warrant::break_even::BreakEvenInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::warrant::break_even::calculate_break_even(&input))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn decompose_warrant(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::warrant::valuation::DecomposeInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::warrant::valuation::try_decompose(&input))?
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_warrant_price(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::warrant::projection::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::warrant::projection::project_price(&input))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_price_grid(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::warrant::projection::PriceGridInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::warrant::projection::build_price_grid(&input))?
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_warrant(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::warrant::detail::WarrantDetailInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::warrant::detail::analyze_warrant(&input))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Symbols
// ---------------------------------------------------------------------------

/// `today` is an ISO date (YYYY-MM-DD).
#[napi]
pub fn describe_symbol(symbol: String, today: String) -> NapiResult<String> {
    let today = parse_date(&today)?;
    let output = warrant_lens_core::warrant::symbol::describe_symbol(&symbol, today);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn parse_expiry(symbol: String) -> NapiResult<String> {
    let date = warrant_lens_core::warrant::symbol::parse_expiry(&symbol).map_err(to_napi_error)?;
    Ok(date.format("%Y-%m-%d").to_string())
}

#[napi]
pub fn parse_conversion_ratio(raw: String) -> String {
    warrant_lens_core::warrant::symbol::parse_conversion_ratio(&raw).to_string()
}

// ---------------------------------------------------------------------------
// Screener & scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn screen_warrants(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::screener::ScreenerInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::screener::screen_warrants(&input))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_scenario_table(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::scenarios::ScenarioTableInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::scenarios::build_scenario_table(&input))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Market board
// ---------------------------------------------------------------------------

#[napi]
pub fn list_warrants(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::market::WarrantListingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::market::list_warrants(&input))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// `warrants_json` is an array of warrant quotes.
#[napi]
pub fn market_statistics(warrants_json: String) -> NapiResult<String> {
    let warrants: Vec<WarrantQuote> =
        serde_json::from_str(&warrants_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::market::market_statistics(&warrants))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn issuer_league(warrants_json: String) -> NapiResult<String> {
    let warrants: Vec<WarrantQuote> =
        serde_json::from_str(&warrants_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::market::issuer_league(&warrants))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Stock board
// ---------------------------------------------------------------------------

#[napi]
pub fn rank_stocks(input_json: String) -> NapiResult<String> {
    let input: warrant_lens_core::stocks::StockRankingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::stocks::rank_stocks(&input))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// `stocks_json` is an array of stock quotes.
#[napi]
pub fn exchange_summary(stocks_json: String) -> NapiResult<String> {
    let stocks: Vec<warrant_lens_core::stocks::StockQuote> =
        serde_json::from_str(&stocks_json).map_err(to_napi_error)?;
    let output = guarded(|| warrant_lens_core::stocks::exchange_summary(&stocks))?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
