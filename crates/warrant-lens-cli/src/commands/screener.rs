use clap::Args;
use serde_json::Value;

use warrant_lens_core::screener::{self, ScreenerInput};
use warrant_lens_core::types::Money;

use crate::config::Settings;
use crate::input;

/// Arguments for the warrant screener
#[derive(Args)]
pub struct ScreenArgs {
    /// Path to JSON/YAML with `warrants`, `underlying_price` and `target_price`
    #[arg(long)]
    pub input: Option<String>,

    /// Override the underlying's current price
    #[arg(long)]
    pub underlying_price: Option<Money>,

    /// Override the target underlying price
    #[arg(long)]
    pub target: Option<Money>,

    /// Units per warrant position (defaults to one board lot)
    #[arg(long)]
    pub quantity: Option<u64>,

    /// all, profitable or unprofitable
    #[arg(long)]
    pub filter: Option<String>,

    /// symbol, break_even, margin, expiry or volume
    #[arg(long)]
    pub sort: Option<String>,
}

pub fn run_screen(args: ScreenArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let mut screen_input: ScreenerInput = input::read_with_settings(args.input.as_deref(), settings)?
        .ok_or("--input <file> or stdin required for the screener")?;

    if let Some(price) = args.underlying_price {
        screen_input.underlying_price = price;
    }
    if let Some(target) = args.target {
        screen_input.target_price = target;
    }
    if let Some(quantity) = args.quantity {
        screen_input.quantity = quantity;
    }
    if let Some(ref filter) = args.filter {
        screen_input.filter = filter.parse()?;
    }
    if let Some(ref sort) = args.sort {
        screen_input.sort_key = sort.parse()?;
    }

    let result = screener::screen_warrants(&screen_input);
    Ok(serde_json::to_value(result)?)
}
