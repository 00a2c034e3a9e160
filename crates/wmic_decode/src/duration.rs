//! Parsing of textual time bounds such as `30m`, `1h30m` or `1.5s`.

use crate::error::QueryError;
use std::time::Duration;

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3600 * 1_000_000_000),
];

/// Parse a sequence of `<decimal><unit>` terms into a duration.
///
/// A bare `0` is accepted. Negative bounds are rejected since a query with
/// no time left would be cancelled before it starts.
pub fn parse_timeout(value: &str) -> Result<Duration, QueryError> {
    let invalid = |reason: &str| QueryError::InvalidTimeout {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let text = value.trim();
    if text.is_empty() {
        return Err(invalid("empty duration"));
    }
    if text.starts_with('-') {
        return Err(invalid("duration must not be negative"));
    }
    let text = text.strip_prefix('+').unwrap_or(text);
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: u128 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid("expected a number"));
        }
        let (whole, fraction) = split_number(&rest[..number_len])
            .ok_or_else(|| invalid("malformed number"))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        if unit_len == 0 {
            return Err(invalid("missing unit"));
        }
        let unit = &rest[..unit_len];
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| invalid(&format!("unknown unit '{}'", unit)))?;
        let (digits, divisor) = fraction;
        total_nanos = whole
            .checked_mul(scale)
            .and_then(|n| n.checked_add(digits * scale / divisor))
            .and_then(|n| total_nanos.checked_add(n))
            .ok_or_else(|| invalid("duration out of range"))?;
        rest = &rest[unit_len..];
    }

    let nanos = u64::try_from(total_nanos).map_err(|_| invalid("duration out of range"))?;
    Ok(Duration::from_nanos(nanos))
}

/// Split `12.345` into `(12, (345, 1000))`.
fn split_number(text: &str) -> Option<(u128, (u128, u128))> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') {
        return None;
    }
    let whole = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    // Truncate so digits * scale stays within u128.
    let fraction = &fraction[..fraction.len().min(18)];
    let digits = if fraction.is_empty() { 0 } else { fraction.parse().ok()? };
    let divisor = 10u128.pow(fraction.len() as u32);
    Some((whole, (digits, divisor)))
}
