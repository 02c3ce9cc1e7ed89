use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::fees::{self, CostBreakdown, RevenueBreakdown};
use crate::types::*;
use crate::WarrantLensResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeInput {
    pub buy_price: Money,
    pub sell_price: Money,
    pub quantity: u64,
    pub buy_fee_percent: Percent,
    pub sell_fee_percent: Percent,
    pub tax_percent: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResult {
    pub cost: CostBreakdown,
    pub revenue: RevenueBreakdown,
    pub profit: Money,
    /// Relative to total cost; 0 when total cost is 0
    pub profit_percent: Percent,
    /// Strictly positive profit; an exact break-even is not a profit
    pub is_profit: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn evaluate_trade(input: &TradeInput) -> TradeResult {
    let cost = fees::calculate_cost(input.buy_price, input.quantity, input.buy_fee_percent);
    let revenue = fees::calculate_revenue(
        input.sell_price,
        input.quantity,
        input.sell_fee_percent,
        input.tax_percent,
    );
    combine(cost, revenue)
}

/// [`evaluate_trade`] for untrusted input: notionals and rates are range
/// checked first, so an overflow becomes `InvalidInput` instead of a panic.
pub fn try_evaluate_trade(input: &TradeInput) -> WarrantLensResult<TradeResult> {
    fees::checked_notional("buy_price", input.buy_price, input.quantity)?;
    fees::checked_notional("sell_price", input.sell_price, input.quantity)?;
    fees::check_rate("buy_fee_percent", input.buy_fee_percent)?;
    fees::check_rate("sell_fee_percent", input.sell_fee_percent)?;
    fees::check_rate("tax_percent", input.tax_percent)?;
    Ok(evaluate_trade(input))
}

/// Profit/loss of an already computed cost and revenue pair.
pub fn combine(cost: CostBreakdown, revenue: RevenueBreakdown) -> TradeResult {
    let profit = revenue.net_revenue - cost.total_cost;
    TradeResult {
        cost,
        revenue,
        profit,
        profit_percent: profit_percent(profit, cost.total_cost),
        is_profit: profit > Decimal::ZERO,
    }
}

pub fn profit_percent(profit: Money, total_cost: Money) -> Percent {
    if total_cost.is_zero() {
        return Decimal::ZERO;
    }
    profit / total_cost * dec!(100)
}

/// Sell price at which net proceeds exactly recover `total_cost`.
///
/// Solves `price * qty * (1 - (fee + tax) / 100) = total_cost`. Returns 0
/// when the quantity is 0 or the combined exit charges reach 100%.
pub fn break_even_sell_price(
    total_cost: Money,
    quantity: u64,
    sell_fee_percent: Percent,
    tax_percent: Percent,
) -> Money {
    let retained = Decimal::ONE - (sell_fee_percent + tax_percent) / dec!(100);
    let denominator = Decimal::from(quantity) * retained;
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    total_cost / denominator
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
