use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values (VND). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages in percent units (0.15 = 0.15%). Never as fractions.
pub type Percent = Decimal;

/// Conversion ratios and leverage multiples
pub type Ratio = Decimal;

/// Sentinel for a maturity the provider has not published yet.
pub const UNKNOWN_MATURITY: i64 = -1;

pub const DEFAULT_BUY_FEE_PERCENT: Percent = dec!(0.15);
pub const DEFAULT_SELL_FEE_PERCENT: Percent = dec!(0.15);
pub const DEFAULT_SELL_TAX_PERCENT: Percent = dec!(0.1);

/// Default fee and tax rates applied when a position or scenario carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSettings {
    pub buy_fee_percent: Percent,
    pub sell_fee_percent: Percent,
    pub sell_tax_percent: Percent,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            buy_fee_percent: DEFAULT_BUY_FEE_PERCENT,
            sell_fee_percent: DEFAULT_SELL_FEE_PERCENT,
            sell_tax_percent: DEFAULT_SELL_TAX_PERCENT,
        }
    }
}

/// A held or hypothetical holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub buy_price: Money,
    pub quantity: u64,
    /// Falls back to `FeeSettings::buy_fee_percent` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_fee_percent: Option<Percent>,
}

impl Position {
    pub fn buy_fee_or(&self, fees: &FeeSettings) -> Percent {
        self.buy_fee_percent.unwrap_or(fees.buy_fee_percent)
    }
}

/// A hypothetical exit for a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub sell_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_fee_percent: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percent: Option<Percent>,
}

impl Scenario {
    pub fn sell_fee_or(&self, fees: &FeeSettings) -> Percent {
        self.sell_fee_percent.unwrap_or(fees.sell_fee_percent)
    }

    pub fn tax_or(&self, fees: &FeeSettings) -> Percent {
        self.tax_percent.unwrap_or(fees.sell_tax_percent)
    }
}

/// Contractual data of a covered warrant at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantTerms {
    pub current_price: Money,
    pub exercise_price: Money,
    /// Number of warrants that convert into one underlying share
    pub conversion_ratio: Ratio,
    /// Negative when the issuer has not published a maturity date
    #[serde(default = "unknown_maturity")]
    pub days_to_maturity: i64,
}

impl WarrantTerms {
    /// Zero ratio or exercise price means the provider has not filled the terms in yet.
    pub fn has_terms(&self) -> bool {
        !self.conversion_ratio.is_zero() && !self.exercise_price.is_zero()
    }
}

/// Quote of the stock a warrant references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingQuote {
    #[serde(default)]
    pub symbol: String,
    pub current_price: Money,
    #[serde(default)]
    pub change: Money,
    #[serde(default)]
    pub change_percent: Percent,
}

/// One warrant row as delivered by the market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantQuote {
    pub symbol: String,
    #[serde(default)]
    pub underlying_symbol: String,
    #[serde(default)]
    pub issuer_name: String,
    pub current_price: Money,
    #[serde(default)]
    pub exercise_price: Money,
    #[serde(default)]
    pub conversion_ratio: Ratio,
    #[serde(default = "unknown_maturity")]
    pub days_to_maturity: i64,
    #[serde(default)]
    pub volume: u64,
    /// Traded value for the session
    #[serde(default)]
    pub value: Money,
    #[serde(default)]
    pub change: Money,
    #[serde(default)]
    pub change_percent: Percent,
}

impl WarrantQuote {
    pub fn terms(&self) -> WarrantTerms {
        WarrantTerms {
            current_price: self.current_price,
            exercise_price: self.exercise_price,
            conversion_ratio: self.conversion_ratio,
            days_to_maturity: self.days_to_maturity,
        }
    }
}

fn unknown_maturity() -> i64 {
    UNKNOWN_MATURITY
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_settings_defaults() {
        let fees = FeeSettings::default();
        assert_eq!(fees.buy_fee_percent, dec!(0.15));
        assert_eq!(fees.sell_fee_percent, dec!(0.15));
        assert_eq!(fees.sell_tax_percent, dec!(0.1));
    }

    #[test]
    fn test_scenario_rates_fall_back_to_settings() {
        let fees = FeeSettings::default();
        let scenario = Scenario {
            id: "s1".into(),
            sell_price: dec!(12000),
            sell_fee_percent: Some(dec!(0.2)),
            tax_percent: None,
        };
        assert_eq!(scenario.sell_fee_or(&fees), dec!(0.2));
        assert_eq!(scenario.tax_or(&fees), dec!(0.1));
    }

    #[test]
    fn test_quote_without_maturity_deserializes_as_unknown() {
        let quote: WarrantQuote = serde_json::from_str(
            r#"{"symbol": "CHPG2505", "current_price": "1500"}"#,
        )
        .unwrap();
        assert_eq!(quote.days_to_maturity, UNKNOWN_MATURITY);
        assert!(!quote.terms().has_terms());
    }

    #[test]
    fn test_partial_fee_settings_keep_defaults() {
        let fees: FeeSettings = serde_json::from_str(r#"{"sell_tax_percent": "0"}"#).unwrap();
        assert_eq!(fees.sell_tax_percent, Decimal::ZERO);
        assert_eq!(fees.buy_fee_percent, DEFAULT_BUY_FEE_PERCENT);
    }
}
