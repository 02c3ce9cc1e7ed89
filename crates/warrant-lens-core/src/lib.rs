pub mod error;
pub mod fees;
pub mod pnl;
pub mod types;
pub mod warrant;

#[cfg(feature = "screener")]
pub mod screener;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "market")]
pub mod market;

#[cfg(feature = "market")]
pub mod stocks;

pub use error::WarrantLensError;
pub use types::*;

/// Standard result type for all warrant-lens operations
pub type WarrantLensResult<T> = Result<T, WarrantLensError>;
