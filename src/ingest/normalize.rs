/// Series normalization.
///
/// Turns one stored series, whatever its shape, into the canonical
/// date-sorted `(date, value)` sequence the analysis works on. Rows whose
/// value does not parse as a number, or whose date does not parse as a
/// calendar date, are dropped rather than kept as blanks. Negative values
/// are clamped to zero, not dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::model::{NormalizedSeries, Observation, RawSeries, SeriesError};

static MISSING: Value = Value::Null;

/// Date-only layouts, tried in order. `%d.%m.%Y` is how the monthly
/// registry exports write their study dates.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Date-time layouts. Time of day is discarded.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalizes one stored series.
///
/// Fails only with `SeriesError::UnsupportedShape`; row-level parse
/// failures are handled by exclusion.
pub fn normalize(raw: &RawSeries) -> Result<NormalizedSeries, SeriesError> {
    let mut observations: Vec<Observation> = date_value_pairs(raw)?
        .into_iter()
        .filter_map(|(date_cell, value_cell)| {
            let value = parse_value(value_cell)?;
            let date = parse_date(date_cell)?;
            Some(Observation { date, value })
        })
        .collect();

    // Stable, so duplicate dates keep their stored order.
    observations.sort_by_key(|o| o.date);

    Ok(NormalizedSeries::from_sorted(observations))
}

/// Maps each stored shape onto positional `(date, value)` cells.
fn date_value_pairs(raw: &RawSeries) -> Result<Vec<(&Value, &Value)>, SeriesError> {
    match raw {
        RawSeries::SingleColumn(pairs) => Ok(pairs.iter().map(|(d, v)| (d, v)).collect()),
        RawSeries::MultiColumn { columns, rows } => {
            if columns.len() < 2 {
                return Err(SeriesError::UnsupportedShape(format!(
                    "table with {} column(s) and no date index",
                    columns.len()
                )));
            }
            Ok(rows
                .iter()
                .map(|row| {
                    (
                        row.first().unwrap_or(&MISSING),
                        row.get(1).unwrap_or(&MISSING),
                    )
                })
                .collect())
        }
        RawSeries::Unrecognized(kind) => Err(SeriesError::UnsupportedShape(kind.clone())),
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Parses a date cell. Strings may be any of the layouts above, RFC 3339
/// or epoch milliseconds; integers are epoch milliseconds. Returns `None`
/// for anything else.
pub fn parse_date(cell: &Value) -> Option<NaiveDate> {
    match cell {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(epoch_millis_date),
        _ => None,
    }
}

fn epoch_millis_date(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        // Object keys are always text, so a date-indexed object written with
        // epoch-millisecond keys lands here.
        .or_else(|| s.parse::<i64>().ok().and_then(epoch_millis_date))
}

/// Parses a value cell into a finite number, clamping negatives to zero.
///
/// Numbers and numeric strings are accepted, booleans count as 1/0.
/// Null, text, and non-finite results are `None`.
pub fn parse_value(cell: &Value) -> Option<f64> {
    let raw = match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;

    if !raw.is_finite() {
        return None;
    }
    // Also folds -0.0 into 0.0.
    Some(if raw <= 0.0 { 0.0 } else { raw })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
