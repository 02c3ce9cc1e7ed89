//! Fee, tax, cost and revenue primitives.
//!
//! Every rate is in percent units (0.15 means 0.15%). The functions are
//! closed-form and never branch on sign; rejecting negative prices or
//! quantities is the job of the input layer.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::WarrantLensError;
use crate::types::{Money, Percent};
use crate::WarrantLensResult;

const HUNDRED: Decimal = dec!(100);

/// Largest `price * quantity` the checked entry points accept.
pub const MAX_NOTIONAL: Money = dec!(1000000000000000000);

/// Acquisition side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub principal: Money,
    pub buy_fee: Money,
    pub total_cost: Money,
}

/// Exit side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub gross_revenue: Money,
    pub sell_fee: Money,
    pub sell_tax: Money,
    pub net_revenue: Money,
}

/// Amount charged at `percent` of `notional`.
pub fn percent_of(notional: Money, percent: Percent) -> Money {
    notional * percent / HUNDRED
}

pub fn buy_fee(principal: Money, buy_fee_percent: Percent) -> Money {
    percent_of(principal, buy_fee_percent)
}

pub fn sell_fee(gross_revenue: Money, sell_fee_percent: Percent) -> Money {
    percent_of(gross_revenue, sell_fee_percent)
}

/// Personal income tax withheld on the gross sale value.
pub fn sell_tax(gross_revenue: Money, tax_percent: Percent) -> Money {
    percent_of(gross_revenue, tax_percent)
}

pub fn calculate_cost(buy_price: Money, quantity: u64, buy_fee_percent: Percent) -> CostBreakdown {
    let principal = buy_price * Decimal::from(quantity);
    let buy_fee = buy_fee(principal, buy_fee_percent);
    CostBreakdown {
        principal,
        buy_fee,
        total_cost: principal + buy_fee,
    }
}

pub fn calculate_revenue(
    sell_price: Money,
    quantity: u64,
    sell_fee_percent: Percent,
    tax_percent: Percent,
) -> RevenueBreakdown {
    let gross_revenue = sell_price * Decimal::from(quantity);
    let sell_fee = sell_fee(gross_revenue, sell_fee_percent);
    let sell_tax = sell_tax(gross_revenue, tax_percent);
    RevenueBreakdown {
        gross_revenue,
        sell_fee,
        sell_tax,
        net_revenue: gross_revenue - sell_fee - sell_tax,
    }
}

/// `price * quantity`, or `InvalidInput` when it leaves the supported range.
pub fn checked_notional(field: &str, price: Money, quantity: u64) -> WarrantLensResult<Money> {
    price
        .checked_mul(Decimal::from(quantity))
        .filter(|notional| notional.abs() <= MAX_NOTIONAL)
        .ok_or_else(|| WarrantLensError::InvalidInput {
            field: field.into(),
            reason: format!("{price} x {quantity} exceeds the supported notional of {MAX_NOTIONAL}"),
        })
}

/// Fee and tax rates must lie in 0..=100 percent.
pub fn check_rate(field: &str, percent: Percent) -> WarrantLensResult<Percent> {
    if percent < Decimal::ZERO || percent > HUNDRED {
        return Err(WarrantLensError::InvalidInput {
            field: field.into(),
            reason: format!("rate {percent}% must be between 0 and 100"),
        });
    }
    Ok(percent)
}
