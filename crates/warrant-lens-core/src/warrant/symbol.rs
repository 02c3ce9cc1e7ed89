//! Covered warrant symbol conventions on the Vietnamese market.
//!
//! Symbols follow `C{UNDERLYING}{YYWW}`: `CHPG2505` is a call on HPG
//! expiring in ISO week 05 of 2025. The issuer and exercise price are not
//! encoded and must come from the provider's security details.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::WarrantLensError;
use crate::types::Ratio;
use crate::warrant::maturity;
use crate::WarrantLensResult;

/// `C` + three-letter ticker + `YYWW`
const MIN_SYMBOL_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub is_covered_warrant: bool,
    pub underlying_symbol: Option<String>,
    /// Friday of the ISO week encoded in the symbol
    pub expected_expiry: Option<NaiveDate>,
    pub days_to_expiry: i64,
}

pub fn is_covered_warrant(symbol: &str) -> bool {
    let symbol = symbol.trim().to_uppercase();
    symbol.starts_with('C') && symbol.len() > 5
}

pub fn parse_underlying(symbol: &str) -> Option<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.len() < MIN_SYMBOL_LEN || !symbol.is_ascii() {
        return None;
    }
    let body = symbol.strip_prefix('C').unwrap_or(&symbol);
    Some(body[..3].to_string())
}

/// Expected expiry date: the Friday of ISO week `WW` in year `20YY`.
pub fn parse_expiry(symbol: &str) -> WarrantLensResult<NaiveDate> {
    let symbol = symbol.trim();
    if symbol.len() < 4 || !symbol.is_ascii() {
        return Err(WarrantLensError::InvalidSymbol(symbol.to_string()));
    }
    let yyww = &symbol[symbol.len() - 4..];
    let invalid = || WarrantLensError::InvalidSymbol(symbol.to_string());
    let yy: i32 = yyww[..2].parse().map_err(|_| invalid())?;
    let week: i64 = yyww[2..].parse().map_err(|_| invalid())?;
    if !(1..=53).contains(&week) {
        return Err(WarrantLensError::InvalidSymbol(format!(
            "{symbol}: week {week} outside 01-53"
        )));
    }

    // ISO week 1 is the week holding January 4th.
    let jan4 = NaiveDate::from_ymd_opt(2000 + yy, 1, 4)
        .ok_or_else(|| WarrantLensError::DateError(format!("no January 4th in 20{yy:02}")))?;
    let week1_monday = jan4 - Duration::days(i64::from(jan4.weekday().num_days_from_monday()));
    Ok(week1_monday + Duration::weeks(week - 1) + Duration::days(4))
}

/// Provider ratios arrive as `"1.6712:1"`, `"2"` or nothing at all.
///
/// Anything unparseable or non-positive falls back to 1.
pub fn parse_conversion_ratio(raw: &str) -> Ratio {
    let raw = raw.trim();
    let leading = raw.split(':').next().unwrap_or_default().trim();
    match Decimal::from_str(leading) {
        Ok(ratio) if ratio > Decimal::ZERO => ratio,
        _ => Decimal::ONE,
    }
}

pub fn describe_symbol(symbol: &str, today: NaiveDate) -> SymbolInfo {
    let symbol = symbol.trim().to_uppercase();
    let is_cw = is_covered_warrant(&symbol);
    let expected_expiry = if is_cw { parse_expiry(&symbol).ok() } else { None };
    SymbolInfo {
        is_covered_warrant: is_cw,
        underlying_symbol: if is_cw { parse_underlying(&symbol) } else { None },
        expected_expiry,
        days_to_expiry: maturity::days_to_maturity(expected_expiry, today),
        symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_underlying() {
        assert_eq!(parse_underlying("CHPG2505").as_deref(), Some("HPG"));
        assert_eq!(parse_underlying("cfpt2614").as_deref(), Some("FPT"));
        assert_eq!(parse_underlying("HPG"), None);
    }

    #[test]
    fn test_parse_expiry_friday_of_iso_week() {
        assert_eq!(parse_expiry("CHPG2505").unwrap(), date(2025, 1, 31));
        assert_eq!(parse_expiry("CFPT2601").unwrap(), date(2026, 1, 2));
        // 2020 has 53 ISO weeks
        assert_eq!(parse_expiry("CVNM2053").unwrap(), date(2021, 1, 1));
    }

    #[test]
    fn test_parse_expiry_rejects_bad_week() {
        assert!(parse_expiry("CHPG2500").is_err());
        assert!(parse_expiry("CHPG2554").is_err());
        assert!(parse_expiry("CHPGXX05").is_err());
    }

    #[test]
    fn test_is_covered_warrant() {
        assert!(is_covered_warrant("CHPG2505"));
        assert!(!is_covered_warrant("HPG"));
        assert!(!is_covered_warrant("CTG"));
        assert!(!is_covered_warrant("VNM2505"));
    }

    #[test]
    fn test_parse_conversion_ratio() {
        assert_eq!(parse_conversion_ratio("1.6712:1"), dec!(1.6712));
        assert_eq!(parse_conversion_ratio("4"), dec!(4));
        assert_eq!(parse_conversion_ratio(" 2 : 1 "), dec!(2));
        assert_eq!(parse_conversion_ratio(""), Decimal::ONE);
        assert_eq!(parse_conversion_ratio("abc"), Decimal::ONE);
        assert_eq!(parse_conversion_ratio("0:1"), Decimal::ONE);
    }

    #[test]
    fn test_describe_symbol() {
        let info = describe_symbol("chpg2505", date(2025, 1, 1));
        assert!(info.is_covered_warrant);
        assert_eq!(info.symbol, "CHPG2505");
        assert_eq!(info.underlying_symbol.as_deref(), Some("HPG"));
        assert_eq!(info.days_to_expiry, 30);

        let stock = describe_symbol("HPG", date(2025, 1, 1));
        assert!(!stock.is_covered_warrant);
        assert_eq!(stock.days_to_expiry, -1);
    }
}
