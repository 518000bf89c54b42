//! Value bucketizer: coarse phrases for money and dates
//!
//! Buckets keep magnitude without precision: `$68,200` becomes "tens of
//! thousands of dollars", `March 14` becomes "mid March". Only English month
//! names are understood.

use crate::config::MoneyBuckets;
use crate::error::{Result, ShieldError};

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn value_error(surface: &str, reason: impl Into<String>) -> ShieldError {
    ShieldError::Value {
        surface: surface.to_string(),
        reason: reason.into(),
    }
}

/// Numeric value of a money token (digits and decimal point only)
pub fn parse_amount(surface: &str) -> Result<f64> {
    let numeric: String = surface
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !numeric.chars().any(|c| c.is_ascii_digit()) {
        return Err(value_error(surface, "no digits"));
    }
    numeric
        .parse::<f64>()
        .map_err(|e| value_error(surface, e.to_string()))
}

/// Bucket phrase for a money token
pub fn bucket_money(surface: &str, buckets: &MoneyBuckets) -> Result<String> {
    let amount = parse_amount(surface)?;
    let idx = buckets
        .thresholds
        .iter()
        .position(|t| amount < *t)
        .unwrap_or(buckets.thresholds.len());
    buckets
        .labels
        .get(idx)
        .cloned()
        .ok_or_else(|| value_error(surface, "no bucket label configured"))
}

/// `early` (1-10), `mid` (11-20) or `late` (21+)
pub fn day_qualifier(day: u32) -> &'static str {
    if day <= 10 {
        "early"
    } else if day <= 20 {
        "mid"
    } else {
        "late"
    }
}

/// Bucket phrase for a `"<Month> <day>"` token, keeping the month as written
///
/// The day may carry an ordinal suffix (`15th`).
pub fn bucket_date(surface: &str) -> Result<String> {
    let mut parts = surface.split_whitespace();
    let (month, day) = match (parts.next(), parts.next(), parts.next()) {
        (Some(month), Some(day), None) => (month, day),
        _ => return Err(value_error(surface, "expected '<Month> <day>'")),
    };

    if !MONTHS.contains(&month.to_lowercase().as_str()) {
        return Err(value_error(surface, format!("unknown month '{}'", month)));
    }
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| day.strip_suffix(suffix))
        .unwrap_or(day);
    let day: u32 = digits
        .parse()
        .map_err(|_| value_error(surface, format!("invalid day '{}'", day)))?;
    if !(1..=31).contains(&day) {
        return Err(value_error(surface, format!("day {} out of range", day)));
    }

    Ok(format!("{} {}", day_qualifier(day), month))
}
