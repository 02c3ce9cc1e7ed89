use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEvenInput {
    pub warrant_price: Money,
    pub conversion_ratio: Ratio,
    pub exercise_price: Money,
    #[serde(default)]
    pub target_underlying_price: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEvenResult {
    pub break_even_price: Money,
    /// Target strictly above break-even; false when no target was given
    pub is_profitable: bool,
    pub profit_margin: Money,
    pub profit_margin_percent: Percent,
}

/// Underlying price at which exercising at maturity recovers the warrant cost.
///
/// Holding `ratio` warrants costs `warrant_price * ratio` per share equivalent,
/// on top of the exercise price itself. Time value decay is ignored.
pub fn break_even_price(warrant_price: Money, conversion_ratio: Ratio, exercise_price: Money) -> Money {
    warrant_price * conversion_ratio + exercise_price
}

pub fn calculate_break_even(input: &BreakEvenInput) -> BreakEvenResult {
    let break_even_price = break_even_price(
        input.warrant_price,
        input.conversion_ratio,
        input.exercise_price,
    );

    let Some(target) = input.target_underlying_price else {
        return BreakEvenResult {
            break_even_price,
            is_profitable: false,
            profit_margin: Decimal::ZERO,
            profit_margin_percent: Decimal::ZERO,
        };
    };

    let profit_margin = target - break_even_price;
    let profit_margin_percent = if break_even_price.is_zero() {
        Decimal::ZERO
    } else {
        profit_margin / break_even_price * dec!(100)
    };

    BreakEvenResult {
        break_even_price,
        is_profitable: target > break_even_price,
        profit_margin,
        profit_margin_percent,
    }
}
