use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::fees::{self, CostBreakdown, RevenueBreakdown};
use crate::pnl;
use crate::types::*;
use crate::warrant::symbol;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTableInput {
    pub position: Position,
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub fees: FeeSettings,
    /// Inferred from the position symbol when absent
    #[serde(default)]
    pub is_warrant: Option<bool>,
}

/// P/L of a position under one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPnl {
    pub scenario_id: String,
    pub sell_price: Money,
    pub sell_fee_percent: Percent,
    pub tax_percent: Percent,
    pub cost: CostBreakdown,
    pub revenue: RevenueBreakdown,
    pub profit: Money,
    pub profit_percent: Percent,
    pub is_profit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioRow {
    Stock {
        detail: ScenarioPnl,
        /// Sell price that recovers total cost after this scenario's fee and tax
        break_even_price: Money,
    },
    Warrant {
        detail: ScenarioPnl,
    },
}

impl ScenarioRow {
    pub fn detail(&self) -> &ScenarioPnl {
        match self {
            ScenarioRow::Stock { detail, .. } | ScenarioRow::Warrant { detail } => detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub best_scenario_id: String,
    pub best_profit: Money,
    pub best_profit_percent: Percent,
    pub worst_scenario_id: String,
    pub worst_profit: Money,
    pub worst_profit_percent: Percent,
    pub average_profit: Money,
    pub average_profit_percent: Percent,
    pub profitable_count: usize,
    pub total_count: usize,
    /// profitable_count / total_count, in percent
    pub hit_rate: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub symbol: String,
    pub is_warrant: bool,
    pub rows: Vec<ScenarioRow>,
    /// None when there are no scenarios
    pub summary: Option<ScenarioSummary>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub fn evaluate_scenario(
    position: &Position,
    scenario: &Scenario,
    fee_settings: &FeeSettings,
    is_warrant: bool,
) -> ScenarioRow {
    let sell_fee_percent = scenario.sell_fee_or(fee_settings);
    let tax_percent = scenario.tax_or(fee_settings);
    let cost = fees::calculate_cost(
        position.buy_price,
        position.quantity,
        position.buy_fee_or(fee_settings),
    );
    let revenue = fees::calculate_revenue(
        scenario.sell_price,
        position.quantity,
        sell_fee_percent,
        tax_percent,
    );
    let trade = pnl::combine(cost, revenue);

    let detail = ScenarioPnl {
        scenario_id: scenario.id.clone(),
        sell_price: scenario.sell_price,
        sell_fee_percent,
        tax_percent,
        cost: trade.cost,
        revenue: trade.revenue,
        profit: trade.profit,
        profit_percent: trade.profit_percent,
        is_profit: trade.is_profit,
    };

    if is_warrant {
        ScenarioRow::Warrant { detail }
    } else {
        ScenarioRow::Stock {
            break_even_price: pnl::break_even_sell_price(
                cost.total_cost,
                position.quantity,
                sell_fee_percent,
                tax_percent,
            ),
            detail,
        }
    }
}

/// Best, worst, mean and hit rate over the rows; ties resolve to the earliest row.
pub fn summarize(rows: &[ScenarioRow]) -> Option<ScenarioSummary> {
    let first = rows.first()?.detail();
    let mut best = first;
    let mut worst = first;
    let mut profit_sum = Decimal::ZERO;
    let mut percent_sum = Decimal::ZERO;
    let mut profitable_count = 0usize;

    for row in rows {
        let detail = row.detail();
        if detail.profit > best.profit {
            best = detail;
        }
        if detail.profit < worst.profit {
            worst = detail;
        }
        profit_sum += detail.profit;
        percent_sum += detail.profit_percent;
        if detail.is_profit {
            profitable_count += 1;
        }
    }

    let total = Decimal::from(rows.len() as u64);
    Some(ScenarioSummary {
        best_scenario_id: best.scenario_id.clone(),
        best_profit: best.profit,
        best_profit_percent: best.profit_percent,
        worst_scenario_id: worst.scenario_id.clone(),
        worst_profit: worst.profit,
        worst_profit_percent: worst.profit_percent,
        average_profit: profit_sum / total,
        average_profit_percent: percent_sum / total,
        profitable_count,
        total_count: rows.len(),
        hit_rate: Decimal::from(profitable_count as u64) / total * dec!(100),
    })
}

pub fn build_scenario_table(input: &ScenarioTableInput) -> ComputationOutput<ScenarioTable> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let is_warrant = input
        .is_warrant
        .unwrap_or_else(|| symbol::is_covered_warrant(&input.position.symbol));

    let rows: Vec<ScenarioRow> = input
        .scenarios
        .iter()
        .map(|s| evaluate_scenario(&input.position, s, &input.fees, is_warrant))
        .collect();

    let summary = summarize(&rows);
    if summary.is_none() {
        warnings.push("No scenarios supplied; summary omitted".into());
    }

    debug!(
        symbol = %input.position.symbol,
        scenarios = rows.len(),
        is_warrant,
        "built scenario table"
    );

    let output = ScenarioTable {
        symbol: input.position.symbol.clone(),
        is_warrant,
        rows,
        summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "What-if scenario table (net of fees and taxes)",
        &serde_json::json!({
            "buy_price": input.position.buy_price.to_string(),
            "quantity": input.position.quantity,
            "buy_fee_percent": input.position.buy_fee_or(&input.fees).to_string(),
            "default_fees": input.fees,
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

    fn position(symbol: &str) -> Position {
        Position {
            symbol: symbol.into(),
            buy_price: dec!(10000),
            quantity: 100,
            buy_fee_percent: Some(dec!(0.15)),
        }
    }

    fn scenario(id: &str, sell_price: Money) -> Scenario {
        Scenario {
            id: id.into(),
            sell_price,
            sell_fee_percent: None,
            tax_percent: None,
        }
    }

    #[test]
    fn test_reference_scenario_row() {
        let row = evaluate_scenario(
            &position("HPG"),
            &scenario("s1", dec!(12000)),
            &FeeSettings::default(),
            false,
        );
        let detail = row.detail();
        assert_eq!(detail.cost.total_cost, dec!(1001500));
        assert_eq!(detail.revenue.sell_fee, dec!(1800));
        assert_eq!(detail.revenue.sell_tax, dec!(1200));
        assert_eq!(detail.profit, dec!(195500));
        assert!(detail.is_profit);
        match row {
            ScenarioRow::Stock { break_even_price, .. } => {
                // 1,001,500 / (100 * 0.9975)
                assert!((break_even_price - dec!(10040.10)).abs() < dec!(0.01));
            }
            ScenarioRow::Warrant { .. } => panic!("expected a stock row"),
        }
    }

    #[test]
    fn test_warrant_rows_have_no_break_even() {
        let input = ScenarioTableInput {
            position: position("CHPG2505"),
            scenarios: vec![scenario("s1", dec!(12000))],
            fees: FeeSettings::default(),
            is_warrant: None,
        };
        let table = build_scenario_table(&input).result;
        assert!(table.is_warrant);
        assert!(matches!(table.rows[0], ScenarioRow::Warrant { .. }));
    }

    #[test]
    fn test_summary_statistics() {
        let rows: Vec<ScenarioRow> = [("up", dec!(12000)), ("flat", dec!(10000)), ("down", dec!(8000))]
            .iter()
            .map(|(id, px)| {
                evaluate_scenario(&position("HPG"), &scenario(id, *px), &FeeSettings::default(), false)
            })
            .collect();
        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.best_scenario_id, "up");
        assert_eq!(summary.worst_scenario_id, "down");
        assert_eq!(summary.best_profit, dec!(195500));
        assert_eq!(summary.profitable_count, 1);
        assert_eq!(summary.total_count, 3);
        let expected_avg = rows.iter().map(|r| r.detail().profit).sum::<Decimal>() / dec!(3);
        assert_eq!(summary.average_profit, expected_avg);
        assert!((summary.hit_rate - dec!(33.33)).abs() < dec!(0.01));
    }

    #[test]
    fn test_summary_ties_resolve_to_first() {
        let rows: Vec<ScenarioRow> = ["a", "b"]
            .iter()
            .map(|id| {
                evaluate_scenario(&position("HPG"), &scenario(id, dec!(11000)), &FeeSettings::default(), false)
            })
            .collect();
        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.best_scenario_id, "a");
        assert_eq!(summary.worst_scenario_id, "a");
    }

    #[test]
    fn test_empty_scenarios_have_no_summary() {
        let input = ScenarioTableInput {
            position: position("HPG"),
            scenarios: vec![],
            fees: FeeSettings::default(),
            is_warrant: Some(false),
        };
        let output = build_scenario_table(&input);
        assert!(output.result.rows.is_empty());
        assert!(output.result.summary.is_none());
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_scenario_own_rates_override_defaults() {
        let mut custom = scenario("s1", dec!(12000));
        custom.sell_fee_percent = Some(Decimal::ZERO);
        custom.tax_percent = Some(Decimal::ZERO);
        let row = evaluate_scenario(&position("HPG"), &custom, &FeeSettings::default(), false);
        assert_eq!(row.detail().revenue.net_revenue, dec!(1200000));
        assert_eq!(row.detail().profit, dec!(198500));
    }

    #[test]
    fn test_row_serializes_with_kind_tag() {
        let row = evaluate_scenario(&position("HPG"), &scenario("s1", dec!(12000)), &FeeSettings::default(), false);
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["kind"], "stock");
        assert!(value.get("break_even_price").is_some());
    }
}
