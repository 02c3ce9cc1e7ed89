use clap::Args;
use serde::Serialize;
use serde_json::Value;

use warrant_lens_core::pnl::{self, TradeInput, TradeResult};
use warrant_lens_core::types::Money;

use crate::config::Settings;
use crate::input;

/// Arguments for a single buy-then-sell trade
#[derive(Args)]
pub struct TradeArgs {
    /// Buy price per unit (VND)
    #[arg(long)]
    pub buy_price: Option<Money>,

    /// Sell price per unit (VND)
    #[arg(long)]
    pub sell_price: Option<Money>,

    /// Number of units
    #[arg(long, default_value = "100")]
    pub quantity: u64,

    /// Path to JSON/YAML trade input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
struct TradeOutput {
    #[serde(flatten)]
    trade: TradeResult,
    /// Sell price at which this position exactly recovers its total cost
    break_even_sell_price: Money,
}

pub fn run_trade(args: TradeArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let fees = settings.fees;
    let trade_input: TradeInput = match input::read_value(args.input.as_deref())? {
        Some(mut value) => {
            // flat trade inputs carry their own rates; fall back to settings
            if let Value::Object(map) = &mut value {
                for (key, rate) in [
                    ("buy_fee_percent", fees.buy_fee_percent),
                    ("sell_fee_percent", fees.sell_fee_percent),
                    ("tax_percent", fees.sell_tax_percent),
                ] {
                    map.entry(key).or_insert(Value::String(rate.to_string()));
                }
            }
            serde_json::from_value(value)?
        }
        None => TradeInput {
            buy_price: args
                .buy_price
                .ok_or("--buy-price is required (or provide --input)")?,
            sell_price: args
                .sell_price
                .ok_or("--sell-price is required (or provide --input)")?,
            quantity: args.quantity,
            buy_fee_percent: fees.buy_fee_percent,
            sell_fee_percent: fees.sell_fee_percent,
            tax_percent: fees.sell_tax_percent,
        },
    };

    let trade = pnl::try_evaluate_trade(&trade_input)?;
    let output = TradeOutput {
        break_even_sell_price: pnl::break_even_sell_price(
            trade.cost.total_cost,
            trade_input.quantity,
            trade_input.sell_fee_percent,
            trade_input.tax_percent,
        ),
        trade,
    };
    Ok(serde_json::to_value(output)?)
}
