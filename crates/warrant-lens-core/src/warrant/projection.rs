use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::WarrantLensError;
use crate::pnl::{self, TradeResult};
use crate::types::*;
use crate::warrant::valuation;
use crate::{fees, WarrantLensResult};

/// Minimum price increment for covered warrants on HOSE (VND).
pub const DEFAULT_MIN_PRICE_UNIT: Money = dec!(10);

const MAX_GRID_POINTS: usize = 500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub underlying_price: Money,
    pub conversion_ratio: Ratio,
    pub exercise_price: Money,
    pub current_warrant_price: Money,
    pub days_to_maturity: i64,
    pub target_underlying_price: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub current_intrinsic_value: Money,
    pub current_time_value: Money,
    pub decay_factor: Decimal,
    pub target_intrinsic_value: Money,
    pub estimated_price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceGridInput {
    pub underlying_price: Money,
    pub warrant: WarrantTerms,
    /// First underlying target of the grid
    pub from: Money,
    /// Last underlying target (inclusive)
    pub to: Money,
    pub step: Money,
    /// Position to evaluate at each grid point
    #[serde(default)]
    pub quantity: Option<u64>,
    /// Defaults to the warrant's current price
    #[serde(default)]
    pub buy_price: Option<Money>,
    #[serde(default)]
    pub fees: FeeSettings,
    #[serde(default)]
    pub min_price_unit: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceGridPoint {
    pub target_underlying_price: Money,
    pub underlying_change_percent: Percent,
    pub estimated_price: Money,
    /// Estimated price rounded to a whole unit, floored at the minimum price unit
    pub grid_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade: Option<TradeResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceGridOutput {
    pub current_intrinsic_value: Money,
    pub current_time_value: Money,
    pub decay_factor: Decimal,
    pub points: Vec<PriceGridPoint>,
}

// ---------------------------------------------------------------------------
// Heuristic
// ---------------------------------------------------------------------------

/// Fraction of today's time value assumed to survive to the target.
///
/// Fixed buckets: more than 30 days keeps it all, more than 14 keeps 80%,
/// anything shorter (including an unknown maturity) keeps half.
pub fn decay_factor(days_to_maturity: i64) -> Decimal {
    if days_to_maturity > 30 {
        Decimal::ONE
    } else if days_to_maturity > 14 {
        dec!(0.8)
    } else {
        dec!(0.5)
    }
}

pub fn project_price(input: &ProjectionInput) -> ProjectionResult {
    let current_intrinsic = valuation::intrinsic_value(
        input.underlying_price,
        input.exercise_price,
        input.conversion_ratio,
    );
    let current_time_value = valuation::time_value(input.current_warrant_price, current_intrinsic);
    let factor = decay_factor(input.days_to_maturity);
    let target_intrinsic = valuation::intrinsic_value(
        input.target_underlying_price,
        input.exercise_price,
        input.conversion_ratio,
    );

    ProjectionResult {
        current_intrinsic_value: current_intrinsic,
        current_time_value,
        decay_factor: factor,
        target_intrinsic_value: target_intrinsic,
        estimated_price: (target_intrinsic + current_time_value * factor).max(Decimal::ZERO),
    }
}

/// Projection for a warrant described by its terms.
pub fn project_terms(terms: &WarrantTerms, underlying_price: Money, target: Money) -> ProjectionResult {
    project_price(&ProjectionInput {
        underlying_price,
        conversion_ratio: terms.conversion_ratio,
        exercise_price: terms.exercise_price,
        current_warrant_price: terms.current_price,
        days_to_maturity: terms.days_to_maturity,
        target_underlying_price: target,
    })
}

/// Snap an estimated price onto the tradable grid.
pub fn to_grid_price(estimated_price: Money, min_price_unit: Money) -> Money {
    estimated_price
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .max(min_price_unit)
}

// ---------------------------------------------------------------------------
// What-if grid
// ---------------------------------------------------------------------------

pub fn build_price_grid(input: &PriceGridInput) -> WarrantLensResult<ComputationOutput<PriceGridOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let targets = grid_targets(input.from, input.to, input.step)?;
    let min_unit = input.min_price_unit.unwrap_or(DEFAULT_MIN_PRICE_UNIT);
    let buy_price = input.buy_price.unwrap_or(input.warrant.current_price);

    if !input.warrant.has_terms() {
        warnings.push("Conversion ratio or exercise price missing; projection uses time value only".into());
    }

    let cost = input
        .quantity
        .map(|qty| fees::calculate_cost(buy_price, qty, input.fees.buy_fee_percent));

    let base = project_terms(&input.warrant, input.underlying_price, input.underlying_price);
    let points: Vec<PriceGridPoint> = targets
        .into_iter()
        .map(|target| {
            let projection = project_terms(&input.warrant, input.underlying_price, target);
            let grid_price = to_grid_price(projection.estimated_price, min_unit);
            let trade = match (input.quantity, cost) {
                (Some(qty), Some(cost)) => {
                    let revenue = fees::calculate_revenue(
                        grid_price,
                        qty,
                        input.fees.sell_fee_percent,
                        input.fees.sell_tax_percent,
                    );
                    Some(pnl::combine(cost, revenue))
                }
                _ => None,
            };
            PriceGridPoint {
                target_underlying_price: target,
                underlying_change_percent: pnl::profit_percent(
                    target - input.underlying_price,
                    input.underlying_price,
                ),
                estimated_price: projection.estimated_price,
                grid_price,
                trade,
            }
        })
        .collect();

    let output = PriceGridOutput {
        current_intrinsic_value: base.current_intrinsic_value,
        current_time_value: base.current_time_value,
        decay_factor: base.decay_factor,
        points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Warrant price projection grid (intrinsic value + decayed time value)",
        &serde_json::json!({
            "underlying_price": input.underlying_price.to_string(),
            "min_price_unit": min_unit.to_string(),
            "buy_price": buy_price.to_string(),
            "decay_buckets": "days > 30: 1.0, days > 14: 0.8, otherwise: 0.5",
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn grid_targets(from: Money, to: Money, step: Money) -> WarrantLensResult<Vec<Money>> {
    if step <= Decimal::ZERO {
        return Err(WarrantLensError::InvalidInput {
            field: "step".into(),
            reason: "Grid step must be positive".into(),
        });
    }
    if from > to {
        return Err(WarrantLensError::InvalidInput {
            field: "from".into(),
            reason: "Grid start must not exceed grid end".into(),
        });
    }
    let mut targets = Vec::new();
    let mut current = from;
    while current <= to {
        if targets.len() == MAX_GRID_POINTS {
            return Err(WarrantLensError::InvalidInput {
                field: "step".into(),
                reason: format!("Grid exceeds {MAX_GRID_POINTS} points"),
            });
        }
        targets.push(current);
        current += step;
    }
    Ok(targets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reference_input(days: i64, target: Money) -> ProjectionInput {
        ProjectionInput {
            underlying_price: dec!(50000),
            conversion_ratio: dec!(4),
            exercise_price: dec!(45000),
            current_warrant_price: dec!(1800),
            days_to_maturity: days,
            target_underlying_price: target,
        }
    }

    fn reference_terms() -> WarrantTerms {
        WarrantTerms {
            current_price: dec!(1800),
            exercise_price: dec!(45000),
            conversion_ratio: dec!(4),
            days_to_maturity: 20,
        }
    }

    #[test]
    fn test_reference_projection() {
        let result = project_price(&reference_input(20, dec!(53000)));
        assert_eq!(result.current_intrinsic_value, dec!(1250));
        assert_eq!(result.current_time_value, dec!(550));
        assert_eq!(result.decay_factor, dec!(0.8));
        assert_eq!(result.target_intrinsic_value, dec!(2000));
        assert_eq!(result.estimated_price, dec!(2440));
    }

    #[test]
    fn test_decay_bucket_boundaries() {
        assert_eq!(decay_factor(31), Decimal::ONE);
        assert_eq!(decay_factor(30), dec!(0.8));
        assert_eq!(decay_factor(15), dec!(0.8));
        assert_eq!(decay_factor(14), dec!(0.5));
        assert_eq!(decay_factor(0), dec!(0.5));
        assert_eq!(decay_factor(UNKNOWN_MATURITY), dec!(0.5));
    }

    #[test]
    fn test_out_of_the_money_target_keeps_decayed_time_value() {
        let result = project_price(&reference_input(40, dec!(40000)));
        assert_eq!(result.target_intrinsic_value, Decimal::ZERO);
        assert_eq!(result.estimated_price, dec!(550));
    }

    #[test]
    fn test_grid_price_rounding_and_floor() {
        assert_eq!(to_grid_price(dec!(2440.5), dec!(10)), dec!(2441));
        assert_eq!(to_grid_price(dec!(2440.4), dec!(10)), dec!(2440));
        assert_eq!(to_grid_price(dec!(3.2), dec!(10)), dec!(10));
        assert_eq!(to_grid_price(Decimal::ZERO, dec!(10)), dec!(10));
    }

    #[test]
    fn test_price_grid_points_and_trade() {
        let input = PriceGridInput {
            underlying_price: dec!(50000),
            warrant: reference_terms(),
            from: dec!(49000),
            to: dec!(53000),
            step: dec!(1000),
            quantity: Some(1000),
            buy_price: None,
            fees: FeeSettings::default(),
            min_price_unit: None,
        };
        let output = build_price_grid(&input).unwrap();
        let points = &output.result.points;
        assert_eq!(points.len(), 5);
        assert_eq!(points[4].target_underlying_price, dec!(53000));
        assert_eq!(points[4].grid_price, dec!(2440));
        assert_eq!(points[1].underlying_change_percent, Decimal::ZERO);

        let trade = points[4].trade.unwrap();
        // bought at the current 1,800
        assert_eq!(trade.cost.principal, dec!(1800000));
        assert!(trade.is_profit);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_price_grid_rejects_bad_range() {
        let mut input = PriceGridInput {
            underlying_price: dec!(50000),
            warrant: reference_terms(),
            from: dec!(53000),
            to: dec!(49000),
            step: dec!(1000),
            quantity: None,
            buy_price: None,
            fees: FeeSettings::default(),
            min_price_unit: None,
        };
        assert!(build_price_grid(&input).is_err());

        input.from = dec!(40000);
        input.step = Decimal::ZERO;
        assert!(build_price_grid(&input).is_err());

        input.step = dec!(1);
        input.to = dec!(60000);
        assert!(build_price_grid(&input).is_err());
    }
}
