use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use warrant_lens_core::types::{FeeSettings, Money, Percent};

/// Fee flags shared by every subcommand; they win over the settings file.
#[derive(Args, Debug, Default)]
pub struct FeeArgs {
    /// Buy fee in percent (0.15 = 0.15%)
    #[arg(long, global = true)]
    pub buy_fee: Option<Percent>,

    /// Sell fee in percent
    #[arg(long, global = true)]
    pub sell_fee: Option<Percent>,

    /// Personal income tax on sales in percent
    #[arg(long, global = true)]
    pub sell_tax: Option<Percent>,
}

/// Settings loaded from `--config`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fees: FeeSettings,
    pub near_expiration_days: Option<i64>,
    pub min_price_unit: Option<Money>,
}

impl Settings {
    /// Defaults, then the file (YAML or JSON by extension), then fee flags.
    pub fn load(path: Option<&str>, flags: &FeeArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Settings::default(),
        };
        if let Some(fee) = flags.buy_fee {
            settings.fees.buy_fee_percent = fee;
        }
        if let Some(fee) = flags.sell_fee {
            settings.fees.sell_fee_percent = fee;
        }
        if let Some(tax) = flags.sell_tax {
            settings.fees.sell_tax_percent = tax;
        }
        settings.validate()?;
        debug!(?settings, "settings resolved");
        Ok(settings)
    }

    fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path, e))?;
        let is_json = Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let settings = if is_json {
            serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse config '{}': {}", path, e))?
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse config '{}': {}", path, e))?
        };
        Ok(settings)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        let rates = [
            ("buy_fee_percent", self.fees.buy_fee_percent),
            ("sell_fee_percent", self.fees.sell_fee_percent),
            ("sell_tax_percent", self.fees.sell_tax_percent),
        ];
        for (name, rate) in rates {
            if rate < Decimal::ZERO {
                return Err(format!("{} must not be negative, got {}", name, rate).into());
            }
        }
        if self.min_price_unit.is_some_and(|unit| unit <= Decimal::ZERO) {
            return Err("min_price_unit must be positive".into());
        }
        if self.near_expiration_days.is_some_and(|days| days < 0) {
            return Err("near_expiration_days must not be negative".into());
        }
        Ok(())
    }

    /// Fill settings into a JSON input object wherever the caller left them out.
    pub fn fill_defaults(&self, value: &mut Value) -> Result<(), Box<dyn std::error::Error>> {
        let Value::Object(map) = value else {
            return Ok(());
        };
        if !map.contains_key("fees") {
            map.insert("fees".into(), serde_json::to_value(self.fees)?);
        }
        if let Some(days) = self.near_expiration_days {
            map.entry("near_expiration_days").or_insert(Value::from(days));
        }
        if let Some(unit) = self.min_price_unit {
            map.entry("min_price_unit")
                .or_insert(Value::String(unit.to_string()));
        }
        Ok(())
    }
}
