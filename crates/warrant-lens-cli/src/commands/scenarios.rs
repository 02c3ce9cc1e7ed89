use clap::Args;
use serde_json::Value;

use warrant_lens_core::scenarios::{self, ScenarioTableInput};
use warrant_lens_core::types::{Money, Position, Scenario};

use crate::config::Settings;
use crate::input;

/// Arguments for the what-if scenario table
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to JSON/YAML with `position` and `scenarios`
    #[arg(long)]
    pub input: Option<String>,

    /// Stock or warrant symbol of the position
    #[arg(long)]
    pub symbol: Option<String>,

    #[arg(long)]
    pub buy_price: Option<Money>,

    #[arg(long, default_value = "100")]
    pub quantity: u64,

    /// Comma-separated sell prices, one scenario each (e.g. "9000,10500,12000")
    #[arg(long, value_delimiter = ',')]
    pub sell_prices: Option<Vec<Money>>,

    /// Treat the position as a covered warrant regardless of its symbol
    #[arg(long)]
    pub warrant: bool,
}

pub fn run_scenarios(args: ScenariosArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let table_input = match input::read_with_settings::<ScenarioTableInput>(args.input.as_deref(), settings)? {
        Some(table_input) => table_input,
        None => {
            let sell_prices = args
                .sell_prices
                .ok_or("--sell-prices is required (or provide --input)")?;
            ScenarioTableInput {
                position: Position {
                    symbol: args.symbol.unwrap_or_default(),
                    buy_price: args
                        .buy_price
                        .ok_or("--buy-price is required (or provide --input)")?,
                    quantity: args.quantity,
                    buy_fee_percent: None,
                },
                scenarios: sell_prices
                    .into_iter()
                    .enumerate()
                    .map(|(i, sell_price)| Scenario {
                        id: format!("s{}", i + 1),
                        sell_price,
                        sell_fee_percent: None,
                        tax_percent: None,
                    })
                    .collect(),
                fees: settings.fees,
                is_warrant: args.warrant.then_some(true),
            }
        }
    };

    let result = scenarios::build_scenario_table(&table_input);
    Ok(serde_json::to_value(result)?)
}
