use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::*;
use crate::warrant::{break_even, maturity, valuation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantDetailInput {
    pub warrant: WarrantQuote,
    #[serde(default)]
    pub underlying: Option<UnderlyingQuote>,
    #[serde(default)]
    pub near_expiration_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarrantDetail {
    pub symbol: String,
    pub underlying_symbol: String,
    pub underlying_price: Money,
    pub break_even_price: Money,
    /// Distance the underlying still has to travel to break even
    pub break_even_distance_percent: Percent,
    pub intrinsic_value: Money,
    pub time_value: Money,
    pub is_in_the_money: bool,
    pub leverage: Ratio,
    pub days_to_maturity: i64,
    pub is_near_expiration: bool,
}

/// Single-warrant analysis against its underlying quote.
pub fn analyze_warrant(input: &WarrantDetailInput) -> ComputationOutput<WarrantDetail> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let quote = &input.warrant;
    let underlying_price = match &input.underlying {
        Some(u) => u.current_price,
        None => {
            warnings.push(format!(
                "No underlying quote for {}; intrinsic value and leverage are zero",
                quote.symbol
            ));
            Decimal::ZERO
        }
    };
    if !quote.terms().has_terms() {
        warnings.push(format!(
            "{}: conversion ratio or exercise price not yet available",
            quote.symbol
        ));
    }

    let break_even = break_even::calculate_break_even(&break_even::BreakEvenInput {
        warrant_price: quote.current_price,
        conversion_ratio: quote.conversion_ratio,
        exercise_price: quote.exercise_price,
        target_underlying_price: Some(underlying_price),
    });
    let intrinsic = valuation::intrinsic_value(
        underlying_price,
        quote.exercise_price,
        quote.conversion_ratio,
    );
    let threshold = input
        .near_expiration_days
        .unwrap_or(maturity::NEAR_EXPIRATION_DAYS);

    let output = WarrantDetail {
        symbol: quote.symbol.clone(),
        underlying_symbol: quote.underlying_symbol.clone(),
        underlying_price,
        break_even_price: break_even.break_even_price,
        // margin is measured from break-even, so negate it into "distance still to go"
        break_even_distance_percent: -break_even.profit_margin_percent,
        intrinsic_value: intrinsic,
        time_value: valuation::time_value(quote.current_price, intrinsic),
        is_in_the_money: valuation::is_in_the_money(underlying_price, quote.exercise_price),
        leverage: valuation::leverage(underlying_price, quote.current_price, quote.conversion_ratio),
        days_to_maturity: quote.days_to_maturity,
        is_near_expiration: maturity::is_near_expiration(quote.days_to_maturity, threshold),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Covered warrant detail (break-even, intrinsic/time value, leverage)",
        &serde_json::json!({
            "symbol": quote.symbol,
            "near_expiration_days": threshold,
        }),
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote() -> WarrantQuote {
        WarrantQuote {
            symbol: "CHPG2505".into(),
            underlying_symbol: "HPG".into(),
            issuer_name: "SSI".into(),
            current_price: dec!(1800),
            exercise_price: dec!(45000),
            conversion_ratio: dec!(4),
            days_to_maturity: 20,
            volume: 125_000,
            value: dec!(225000000),
            change: dec!(50),
            change_percent: dec!(2.86),
        }
    }

    #[test]
    fn test_detail_with_underlying() {
        let input = WarrantDetailInput {
            warrant: quote(),
            underlying: Some(UnderlyingQuote {
                symbol: "HPG".into(),
                current_price: dec!(50000),
                change: dec!(500),
                change_percent: dec!(1.01),
            }),
            near_expiration_days: None,
        };
        let output = analyze_warrant(&input);
        let detail = &output.result;
        assert_eq!(detail.break_even_price, dec!(52200));
        assert_eq!(detail.intrinsic_value, dec!(1250));
        assert_eq!(detail.time_value, dec!(550));
        assert!(detail.is_in_the_money);
        assert!(detail.is_near_expiration);
        // (52,200 - 50,000) / 52,200 = 4.21% still to go
        assert!((detail.break_even_distance_percent - dec!(4.21)).abs() < dec!(0.01));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_detail_without_underlying_warns() {
        let input = WarrantDetailInput {
            warrant: quote(),
            underlying: None,
            near_expiration_days: Some(10),
        };
        let output = analyze_warrant(&input);
        assert_eq!(output.result.leverage, Decimal::ZERO);
        assert_eq!(output.result.intrinsic_value, Decimal::ZERO);
        assert!(!output.result.is_near_expiration);
        assert_eq!(output.warnings.len(), 1);
    }
}
