pub mod break_even;
pub mod detail;
pub mod maturity;
pub mod projection;
pub mod symbol;
pub mod valuation;
