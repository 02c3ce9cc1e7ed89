use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use warrant_lens_core::market::{self, ListingSortKey, SortOrder, WarrantListingInput, WarrantQuery};
use warrant_lens_core::scenarios::{self, ScenarioRow, ScenarioTableInput};
use warrant_lens_core::screener::{self, ScreenerFilter, ScreenerInput, SortKey};
use warrant_lens_core::types::*;

fn hpg_board() -> Vec<WarrantQuote> {
    let quote = |symbol: &str, price: Money, exercise: Money, ratio: Ratio, days: i64, volume: u64| {
        WarrantQuote {
            symbol: symbol.into(),
            underlying_symbol: "HPG".into(),
            issuer_name: if volume > 1000 { "SSI".into() } else { "KIS".into() },
            current_price: price,
            exercise_price: exercise,
            conversion_ratio: ratio,
            days_to_maturity: days,
            volume,
            value: price * Decimal::from(volume),
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
        }
    };
    vec![
        quote("CHPG2505", dec!(1800), dec!(45000), dec!(4), 20, 125_000),
        quote("CHPG2508", dec!(1200), dec!(50000), dec!(2), 75, 40_000),
        quote("CHPG2510", dec!(900), dec!(60000), dec!(5), 5, 800),
        // terms not yet published
        quote("CHPG2512", dec!(500), Decimal::ZERO, Decimal::ZERO, -1, 0),
    ]
}

fn screener_input() -> ScreenerInput {
    ScreenerInput {
        warrants: hpg_board(),
        underlying_price: dec!(50000),
        target_price: dec!(53000),
        fees: FeeSettings::default(),
        quantity: 1000,
        filter: ScreenerFilter::All,
        sort_key: SortKey::Symbol,
        near_expiration_days: None,
    }
}

// ===========================================================================
// Screener
// ===========================================================================

#[test]
fn test_screen_all_keeps_every_warrant() {
    let output = screener::screen_warrants(&screener_input());
    let symbols: Vec<&str> = output.result.rows.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["CHPG2505", "CHPG2508", "CHPG2510", "CHPG2512"]);
    assert_eq!(output.result.total_warrants, 4);
    assert_eq!(output.warnings.len(), 1);
    assert!(output.warnings[0].contains("CHPG2512"));
}

#[test]
fn test_profitable_and_unprofitable_partition_the_board() {
    let mut input = screener_input();
    input.filter = ScreenerFilter::Profitable;
    let profitable = screener::screen_warrants(&input).result;
    input.filter = ScreenerFilter::Unprofitable;
    let unprofitable = screener::screen_warrants(&input).result;

    assert_eq!(profitable.matched + unprofitable.matched, 4);
    assert_eq!(profitable.matched, profitable.profitable_count);
    assert!(profitable.rows.iter().all(|r| r.estimated_profit > Decimal::ZERO));
    assert!(unprofitable.rows.iter().all(|r| r.estimated_profit <= Decimal::ZERO));
}

#[test]
fn test_margin_sort_is_descending() {
    let mut input = screener_input();
    input.sort_key = SortKey::Margin;
    let rows = screener::screen_warrants(&input).result.rows;
    assert!(rows
        .windows(2)
        .all(|w| w[0].profit_margin_percent >= w[1].profit_margin_percent));
}

#[test]
fn test_screener_input_from_json_uses_defaults() {
    let input: ScreenerInput = serde_json::from_str(
        r#"{
            "warrants": [{"symbol": "CHPG2505", "current_price": "1800",
                          "exercise_price": "45000", "conversion_ratio": "4",
                          "days_to_maturity": 20}],
            "underlying_price": "50000",
            "target_price": "53000",
            "sort_key": "break_even"
        }"#,
    )
    .unwrap();
    assert_eq!(input.quantity, screener::DEFAULT_LOT_SIZE);
    assert_eq!(input.filter, ScreenerFilter::All);
    assert_eq!(input.sort_key, SortKey::BreakEven);
    assert_eq!(input.fees, FeeSettings::default());
}

// ===========================================================================
// Screener feeding scenarios
// ===========================================================================

#[test]
fn test_projected_price_as_exit_scenario() {
    let row = screener::screen_warrants(&screener_input())
        .result
        .rows
        .into_iter()
        .find(|r| r.symbol == "CHPG2505")
        .unwrap();

    let table = scenarios::build_scenario_table(&ScenarioTableInput {
        position: Position {
            symbol: row.symbol.clone(),
            buy_price: row.current_price,
            quantity: 1000,
            buy_fee_percent: None,
        },
        scenarios: vec![
            Scenario {
                id: "target".into(),
                sell_price: row.estimated_price,
                sell_fee_percent: None,
                tax_percent: None,
            },
            Scenario {
                id: "flat".into(),
                sell_price: row.current_price,
                sell_fee_percent: None,
                tax_percent: None,
            },
        ],
        fees: FeeSettings::default(),
        is_warrant: None,
    })
    .result;

    assert!(table.is_warrant);
    assert!(matches!(table.rows[0], ScenarioRow::Warrant { .. }));
    assert_eq!(table.rows[0].detail().profit, row.estimated_profit);

    let summary = table.summary.unwrap();
    assert_eq!(summary.best_scenario_id, "target");
    assert_eq!(summary.worst_scenario_id, "flat");
    assert_eq!(summary.hit_rate, dec!(50));
}

// ===========================================================================
// Market board
// ===========================================================================

#[test]
fn test_listing_by_leverage_with_underlying_quote() {
    let listing = market::list_warrants(&WarrantListingInput {
        warrants: hpg_board(),
        underlying: vec![UnderlyingQuote {
            symbol: "HPG".into(),
            current_price: dec!(50000),
            ..Default::default()
        }],
        query: WarrantQuery {
            sort_by: Some(ListingSortKey::Leverage),
            sort_order: SortOrder::Desc,
            limit: Some(1),
            ..Default::default()
        },
    })
    .result;
    assert_eq!(listing.total, 4);
    // 50,000 / (1,200 * 2) = 20.83x beats 6.94x and 11.1x
    assert_eq!(listing.warrants[0].quote.symbol, "CHPG2508");
}

#[test]
fn test_statistics_and_league_agree() {
    let board = hpg_board();
    let stats = market::market_statistics(&board).result;
    let league = market::issuer_league(&board);
    assert_eq!(stats.total_underlying, 1);
    assert_eq!(stats.unchanged, 4);
    for entry in &league {
        assert_eq!(stats.by_issuer[&entry.name].count, entry.warrant_count);
    }
    assert_eq!(league[0].name, "KIS");
}
