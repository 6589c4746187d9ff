use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::ParseError;
use crate::Candle;

pub(super) const REQUIRED_FIELDS: [&str; 6] = ["time", "open", "high", "low", "close", "volume"];

// Numeric timestamps below this are milliseconds, anything else is nanoseconds already.
const MILLIS_THRESHOLD: u64 = 10_000_000_000_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
// 2^64, the first float that no longer fits into a u64.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Apply the millisecond/nanosecond magnitude rule to an integer timestamp.
pub(super) fn scale_timestamp(value: u64) -> u64 {
    if value < MILLIS_THRESHOLD {
        value * NANOS_PER_MILLI
    } else {
        value
    }
}

/// Floor a float timestamp and scale it. Negative or out of range values are rejected.
pub(super) fn scale_float_timestamp(value: f64) -> Option<u64> {
    let floored = value.floor();
    if !floored.is_finite() || floored < 0.0 || floored >= U64_LIMIT {
        return None;
    }
    Some(scale_timestamp(floored as u64))
}

/// Interpret a textual time cell. Anything with a hyphen or a 'T' is a calendar
/// date, everything else a numeric unix timestamp.
pub(super) fn parse_time_text(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.contains('-') || text.contains('T') {
        let millis = parse_calendar_millis(text)?;
        u64::try_from(millis).ok()?.checked_mul(NANOS_PER_MILLI)
    } else {
        parse_numeric_time(text)
    }
}

fn parse_numeric_time(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    // Integers go through u64 first so large nanosecond values keep their precision.
    match text.parse::<u64>() {
        Ok(value) => Some(scale_timestamp(value)),
        Err(_) => scale_float_timestamp(text.parse::<f64>().ok()?),
    }
}

// Date-times without an offset are read as UTC.
fn parse_calendar_millis(text: &str) -> Option<i64> {
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }

    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp_millis())
}

/// Coerce a JSON time field: integers, floats (floored) or numeric strings.
pub(super) fn coerce_time(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => match number.as_u64() {
            Some(integer) => Some(scale_timestamp(integer)),
            None => scale_float_timestamp(number.as_f64()?),
        },
        Value::String(text) => parse_numeric_time(text.trim()),
        _ => None,
    }
}

/// Coerce a JSON price or volume field: numbers or numeric strings.
pub(super) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                text.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

/// Validate one element of a JSON dataset. Field names are case sensitive.
pub(super) fn validate_record(row: usize, item: &Value) -> Result<Candle, ParseError> {
    let record = item.as_object().ok_or(ParseError::MissingField {
        row,
        field: REQUIRED_FIELDS[0],
    })?;

    for field in REQUIRED_FIELDS {
        if !record.contains_key(field) {
            return Err(ParseError::MissingField { row, field });
        }
    }

    let time = coerce_time(&record["time"]).ok_or(ParseError::InvalidTimeFormat { row })?;
    let number = |field: &str| coerce_number(&record[field]);

    match (
        number("open"),
        number("high"),
        number("low"),
        number("close"),
        number("volume"),
    ) {
        (Some(open), Some(high), Some(low), Some(close), Some(volume)) => check_candle(
            row,
            Candle {
                time,
                open,
                high,
                low,
                close,
                volume,
            },
        ),
        _ => Err(ParseError::NonNumericOhlcv { row }),
    }
}

/// Checks shared by both file formats once the time is normalized.
pub(super) fn check_candle(row: usize, candle: Candle) -> Result<Candle, ParseError> {
    let values = [
        candle.open,
        candle.high,
        candle.low,
        candle.close,
        candle.volume,
    ];

    if values.iter().any(|value| !value.is_finite()) {
        return Err(ParseError::NonNumericOhlcv { row });
    }

    if candle.high < candle.low {
        return Err(ParseError::HighLessThanLow { row });
    }

    if values.iter().any(|value| *value < 0.0) {
        return Err(ParseError::NegativeValue { row });
    }

    Ok(candle)
}
