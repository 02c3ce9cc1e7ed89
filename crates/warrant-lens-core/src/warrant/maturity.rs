use chrono::NaiveDate;

use crate::types::UNKNOWN_MATURITY;

/// Warrants at or under this many days to maturity are flagged as expiring.
pub const NEAR_EXPIRATION_DAYS: i64 = 30;

const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Parse a maturity date in any of the provider's formats.
pub fn parse_maturity_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(raw);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// `YYYYMMDD`, as used by the trading-date fields.
fn parse_compact(raw: &str) -> Option<NaiveDate> {
    let year = raw[..4].parse().ok()?;
    let month = raw[4..6].parse().ok()?;
    let day = raw[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Whole days from `today` to `maturity`, floored at 0.
///
/// Returns the unknown-maturity sentinel when no date is available.
pub fn days_to_maturity(maturity: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match maturity {
        Some(date) => (date - today).num_days().max(0),
        None => UNKNOWN_MATURITY,
    }
}

/// Unknown maturities are never near expiration.
pub fn is_near_expiration(days_to_maturity: i64, threshold_days: i64) -> bool {
    days_to_maturity >= 0 && days_to_maturity <= threshold_days
}
