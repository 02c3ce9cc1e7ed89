use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use warrant_lens_core::types::{Money, Ratio, WarrantTerms};
use warrant_lens_core::warrant::break_even::{self, BreakEvenInput};
use warrant_lens_core::warrant::detail::{self, WarrantDetailInput};
use warrant_lens_core::warrant::maturity;
use warrant_lens_core::warrant::projection::{self, PriceGridInput, ProjectionInput, ProjectionResult};
use warrant_lens_core::warrant::symbol::{self, SymbolInfo};
use warrant_lens_core::warrant::valuation::{self, DecomposeInput};

use crate::config::Settings;
use crate::input;

/// Arguments for the warrant break-even calculation
#[derive(Args)]
pub struct BreakEvenArgs {
    /// Warrant market price (VND)
    #[arg(long)]
    pub warrant_price: Option<Money>,

    /// Warrants per underlying share
    #[arg(long, alias = "ratio")]
    pub conversion_ratio: Option<Ratio>,

    /// Exercise price (VND)
    #[arg(long)]
    pub exercise_price: Option<Money>,

    /// Underlying price to measure the margin against
    #[arg(long)]
    pub target: Option<Money>,

    /// Path to JSON/YAML input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for intrinsic/time value decomposition
#[derive(Args)]
pub struct DecomposeArgs {
    #[arg(long)]
    pub underlying_price: Option<Money>,

    #[arg(long)]
    pub exercise_price: Option<Money>,

    #[arg(long, alias = "ratio")]
    pub conversion_ratio: Option<Ratio>,

    /// Warrant market price
    #[arg(long)]
    pub warrant_price: Option<Money>,

    /// Held quantity, for exercise profit
    #[arg(long)]
    pub quantity: Option<u64>,

    /// Purchase price of the held warrants, for exercise profit
    #[arg(long)]
    pub buy_price: Option<Money>,

    /// Path to JSON/YAML input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a single price projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProjectArgs {
    #[arg(long)]
    pub underlying_price: Option<Money>,

    #[arg(long, alias = "ratio")]
    pub conversion_ratio: Option<Ratio>,

    #[arg(long)]
    pub exercise_price: Option<Money>,

    /// Warrant market price today
    #[arg(long)]
    pub warrant_price: Option<Money>,

    /// Days to maturity (-1 when unknown)
    #[arg(long, default_value = "-1")]
    pub days: i64,

    /// Target underlying price
    #[arg(long)]
    pub target: Option<Money>,

    /// Path to JSON/YAML input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the projection grid over a range of underlying targets
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PriceGridArgs {
    #[arg(long)]
    pub underlying_price: Option<Money>,

    #[arg(long)]
    pub warrant_price: Option<Money>,

    #[arg(long, alias = "ratio")]
    pub conversion_ratio: Option<Ratio>,

    #[arg(long)]
    pub exercise_price: Option<Money>,

    #[arg(long, default_value = "-1")]
    pub days: i64,

    /// First underlying target
    #[arg(long)]
    pub from: Option<Money>,

    /// Last underlying target (inclusive)
    #[arg(long)]
    pub to: Option<Money>,

    #[arg(long)]
    pub step: Option<Money>,

    /// Evaluate a position of this size at each point
    #[arg(long)]
    pub quantity: Option<u64>,

    /// Defaults to the warrant price
    #[arg(long)]
    pub buy_price: Option<Money>,

    /// Path to JSON/YAML input (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for single-warrant detail
#[derive(Args)]
pub struct DetailArgs {
    /// Path to JSON/YAML with `warrant` and optional `underlying` quotes
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for symbol inspection
#[derive(Args)]
pub struct SymbolArgs {
    /// Ticker, e.g. CHPG2505
    pub symbol: String,

    /// Reference date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Provider conversion ratio text, e.g. "1.6712:1"
    #[arg(long)]
    pub ratio_text: Option<String>,

    /// Published maturity date (dd/mm/yyyy, yyyy-mm-dd or yyyymmdd)
    #[arg(long)]
    pub maturity_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProjectOutput {
    #[serde(flatten)]
    projection: ProjectionResult,
    /// Estimate snapped to the tradable price grid
    grid_price: Money,
}

#[derive(Debug, Serialize)]
struct DecomposeOutput {
    #[serde(flatten)]
    value: valuation::WarrantValue,
    leverage: Ratio,
}

#[derive(Debug, Serialize)]
struct SymbolOutput {
    #[serde(flatten)]
    info: SymbolInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversion_ratio: Option<Ratio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maturity_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_to_maturity: Option<i64>,
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T, Box<dyn std::error::Error>> {
    value.ok_or_else(|| format!("--{} is required (or provide --input)", flag).into())
}

pub fn run_break_even(args: BreakEvenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let be_input: BreakEvenInput = match input::read_value(args.input.as_deref())? {
        Some(value) => serde_json::from_value(value)?,
        None => BreakEvenInput {
            warrant_price: required(args.warrant_price, "warrant-price")?,
            conversion_ratio: required(args.conversion_ratio, "conversion-ratio")?,
            exercise_price: required(args.exercise_price, "exercise-price")?,
            target_underlying_price: args.target,
        },
    };
    Ok(serde_json::to_value(break_even::calculate_break_even(&be_input))?)
}

pub fn run_decompose(args: DecomposeArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let mut dec_input: DecomposeInput = match input::read_value(args.input.as_deref())? {
        Some(value) => serde_json::from_value(value)?,
        None => DecomposeInput {
            underlying_price: required(args.underlying_price, "underlying-price")?,
            exercise_price: required(args.exercise_price, "exercise-price")?,
            conversion_ratio: required(args.conversion_ratio, "conversion-ratio")?,
            current_warrant_price: required(args.warrant_price, "warrant-price")?,
            quantity: args.quantity,
            buy_price: args.buy_price,
            buy_fee_percent: None,
        },
    };
    if dec_input.buy_fee_percent.is_none() {
        dec_input.buy_fee_percent = Some(settings.fees.buy_fee_percent);
    }

    let output = DecomposeOutput {
        value: valuation::try_decompose(&dec_input)?,
        leverage: valuation::leverage(
            dec_input.underlying_price,
            dec_input.current_warrant_price,
            dec_input.conversion_ratio,
        ),
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_project(args: ProjectArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let proj_input: ProjectionInput = match input::read_value(args.input.as_deref())? {
        Some(value) => serde_json::from_value(value)?,
        None => ProjectionInput {
            underlying_price: required(args.underlying_price, "underlying-price")?,
            conversion_ratio: required(args.conversion_ratio, "conversion-ratio")?,
            exercise_price: required(args.exercise_price, "exercise-price")?,
            current_warrant_price: required(args.warrant_price, "warrant-price")?,
            days_to_maturity: args.days,
            target_underlying_price: required(args.target, "target")?,
        },
    };
    let projection = projection::project_price(&proj_input);
    let min_unit = settings
        .min_price_unit
        .unwrap_or(projection::DEFAULT_MIN_PRICE_UNIT);
    let output = ProjectOutput {
        grid_price: projection::to_grid_price(projection.estimated_price, min_unit),
        projection,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_price_grid(args: PriceGridArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let grid_input: PriceGridInput = match input::read_with_settings(args.input.as_deref(), settings)? {
        Some(grid_input) => grid_input,
        None => PriceGridInput {
            underlying_price: required(args.underlying_price, "underlying-price")?,
            warrant: WarrantTerms {
                current_price: required(args.warrant_price, "warrant-price")?,
                exercise_price: required(args.exercise_price, "exercise-price")?,
                conversion_ratio: required(args.conversion_ratio, "conversion-ratio")?,
                days_to_maturity: args.days,
            },
            from: required(args.from, "from")?,
            to: required(args.to, "to")?,
            step: required(args.step, "step")?,
            quantity: args.quantity,
            buy_price: args.buy_price,
            fees: settings.fees,
            min_price_unit: settings.min_price_unit,
        },
    };
    let result = projection::build_price_grid(&grid_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_detail(args: DetailArgs, settings: &Settings) -> Result<Value, Box<dyn std::error::Error>> {
    let detail_input: WarrantDetailInput = input::read_with_settings(args.input.as_deref(), settings)?
        .ok_or("--input <file> or stdin required for warrant detail")?;
    Ok(serde_json::to_value(detail::analyze_warrant(&detail_input))?)
}

pub fn run_symbol(args: SymbolArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let maturity_date = match args.maturity_date.as_deref() {
        Some(raw) => Some(
            maturity::parse_maturity_date(raw)
                .ok_or_else(|| format!("Unrecognised maturity date '{}'", raw))?,
        ),
        None => None,
    };

    let output = SymbolOutput {
        info: symbol::describe_symbol(&args.symbol, today),
        conversion_ratio: args.ratio_text.as_deref().map(symbol::parse_conversion_ratio),
        days_to_maturity: maturity_date.map(|date| maturity::days_to_maturity(Some(date), today)),
        maturity_date,
    };
    Ok(serde_json::to_value(output)?)
}
