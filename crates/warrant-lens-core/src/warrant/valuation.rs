use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::WarrantLensError;
use crate::fees;
use crate::types::*;
use crate::WarrantLensResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposeInput {
    pub underlying_price: Money,
    pub exercise_price: Money,
    pub conversion_ratio: Ratio,
    pub current_warrant_price: Money,
    /// Quantity held; exercise profit is only computed with a buy price too
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub buy_price: Option<Money>,
    #[serde(default)]
    pub buy_fee_percent: Option<Percent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantValue {
    pub intrinsic_value: Money,
    pub is_in_the_money: bool,
    pub time_value: Money,
    /// Cash settlement at maturity minus total cost; 0 without a position
    pub exercise_profit: Money,
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// In-the-money value per warrant, floored at zero.
///
/// A zero ratio means the terms are not published yet and yields zero.
pub fn intrinsic_value(underlying_price: Money, exercise_price: Money, conversion_ratio: Ratio) -> Money {
    if conversion_ratio <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((underlying_price - exercise_price) / conversion_ratio).max(Decimal::ZERO)
}

/// [`intrinsic_value`] that reports an out-of-range result (a tiny ratio
/// against a wide price gap) instead of overflowing.
pub fn checked_intrinsic_value(
    underlying_price: Money,
    exercise_price: Money,
    conversion_ratio: Ratio,
) -> WarrantLensResult<Money> {
    if conversion_ratio <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    underlying_price
        .checked_sub(exercise_price)
        .and_then(|gap| gap.checked_div(conversion_ratio))
        .filter(|value| value.abs() <= fees::MAX_NOTIONAL)
        .map(|value| value.max(Decimal::ZERO))
        .ok_or_else(|| WarrantLensError::InvalidInput {
            field: "conversion_ratio".into(),
            reason: format!(
                "({underlying_price} - {exercise_price}) / {conversion_ratio} is outside the supported range"
            ),
        })
}

pub fn time_value(current_warrant_price: Money, intrinsic_value: Money) -> Money {
    (current_warrant_price - intrinsic_value).max(Decimal::ZERO)
}

pub fn is_in_the_money(underlying_price: Money, exercise_price: Money) -> bool {
    underlying_price > exercise_price
}

/// Underlying exposure bought per unit of warrant premium.
pub fn leverage(underlying_price: Money, warrant_price: Money, conversion_ratio: Ratio) -> Ratio {
    if warrant_price <= Decimal::ZERO || conversion_ratio <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    underlying_price / (warrant_price * conversion_ratio)
}

pub fn decompose(input: &DecomposeInput) -> WarrantValue {
    let intrinsic = intrinsic_value(
        input.underlying_price,
        input.exercise_price,
        input.conversion_ratio,
    );

    // Settlement is contractual, not a market sale: no sell fee or tax.
    let exercise_profit = match (input.quantity, input.buy_price) {
        (Some(quantity), Some(buy_price)) => {
            let cost = fees::calculate_cost(
                buy_price,
                quantity,
                input.buy_fee_percent.unwrap_or(Decimal::ZERO),
            );
            intrinsic * Decimal::from(quantity) - cost.total_cost
        }
        _ => Decimal::ZERO,
    };

    WarrantValue {
        intrinsic_value: intrinsic,
        is_in_the_money: is_in_the_money(input.underlying_price, input.exercise_price),
        time_value: time_value(input.current_warrant_price, intrinsic),
        exercise_profit,
    }
}

/// [`decompose`] with the intrinsic value and position notionals range checked.
pub fn try_decompose(input: &DecomposeInput) -> WarrantLensResult<WarrantValue> {
    let intrinsic = checked_intrinsic_value(
        input.underlying_price,
        input.exercise_price,
        input.conversion_ratio,
    )?;
    if let (Some(quantity), Some(buy_price)) = (input.quantity, input.buy_price) {
        fees::checked_notional("intrinsic_value", intrinsic, quantity)?;
        fees::checked_notional("buy_price", buy_price, quantity)?;
    }
    if let Some(fee) = input.buy_fee_percent {
        fees::check_rate("buy_fee_percent", fee)?;
    }
    Ok(decompose(input))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn itm_input() -> DecomposeInput {
        DecomposeInput {
            underlying_price: dec!(50000),
            exercise_price: dec!(45000),
            conversion_ratio: dec!(4),
            current_warrant_price: dec!(1800),
            quantity: None,
            buy_price: None,
            buy_fee_percent: None,
        }
    }

    #[test]
    fn test_in_the_money_split_is_exact() {
        let value = decompose(&itm_input());
        assert_eq!(value.intrinsic_value, dec!(1250));
        assert_eq!(value.time_value, dec!(550));
        assert!(value.is_in_the_money);
        assert_eq!(value.intrinsic_value + value.time_value, dec!(1800));
        assert_eq!(value.exercise_profit, Decimal::ZERO);
    }

    #[test]
    fn test_out_of_the_money_intrinsic_floored() {
        let mut input = itm_input();
        input.underlying_price = dec!(40000);
        let value = decompose(&input);
        assert_eq!(value.intrinsic_value, Decimal::ZERO);
        assert_eq!(value.time_value, dec!(1800));
        assert!(!value.is_in_the_money);
    }

    #[test]
    fn test_price_below_intrinsic_time_value_floored() {
        let mut input = itm_input();
        input.current_warrant_price = dec!(1000);
        let value = decompose(&input);
        assert_eq!(value.time_value, Decimal::ZERO);
        assert!(value.intrinsic_value + value.time_value != input.current_warrant_price);
    }

    #[test]
    fn test_at_the_money_is_not_in_the_money() {
        let mut input = itm_input();
        input.underlying_price = dec!(45000);
        assert!(!decompose(&input).is_in_the_money);
    }

    #[test]
    fn test_exercise_profit_requires_quantity_and_buy_price() {
        let mut input = itm_input();
        input.quantity = Some(1000);
        assert_eq!(decompose(&input).exercise_profit, Decimal::ZERO);

        input.buy_price = Some(dec!(1000));
        input.buy_fee_percent = Some(dec!(0.15));
        // 1,250 * 1,000 - (1,000,000 + 1,500)
        assert_eq!(decompose(&input).exercise_profit, dec!(248500));
    }

    #[test]
    fn test_zero_ratio_yields_zero_intrinsic() {
        assert_eq!(intrinsic_value(dec!(50000), dec!(45000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_leverage() {
        // 50,000 / (1,800 * 4) = 6.94x
        let lev = leverage(dec!(50000), dec!(1800), dec!(4));
        assert!((lev - dec!(6.94)).abs() < dec!(0.01));
        assert_eq!(leverage(dec!(50000), Decimal::ZERO, dec!(4)), Decimal::ZERO);
        assert_eq!(leverage(dec!(50000), dec!(1800), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_checked_intrinsic_agrees_in_range() {
        assert_eq!(
            checked_intrinsic_value(dec!(50000), dec!(45000), dec!(4)).unwrap(),
            intrinsic_value(dec!(50000), dec!(45000), dec!(4))
        );
        assert_eq!(
            checked_intrinsic_value(dec!(50000), dec!(45000), Decimal::ZERO).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_tiny_ratio_is_rejected() {
        let ratio = Decimal::new(1, 27);
        assert!(checked_intrinsic_value(dec!(50000), dec!(45000), ratio).is_err());

        let mut input = itm_input();
        input.conversion_ratio = ratio;
        assert!(try_decompose(&input).is_err());
    }

    #[test]
    fn test_try_decompose_checks_position_size() {
        let mut input = itm_input();
        input.buy_price = Some(dec!(1000));
        input.quantity = Some(1000);
        assert_eq!(try_decompose(&input).unwrap().exercise_profit, dec!(250000));

        input.quantity = Some(u64::MAX);
        assert!(try_decompose(&input).is_err());
    }
}
