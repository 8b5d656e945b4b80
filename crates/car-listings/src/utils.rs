//! Shared helpers for moving column data between polars and plain vectors.
//!
//! The imputers and dashboard views work on `Vec<Option<T>>` so the
//! group-wise logic stays independent of the frame engine; these helpers do
//! the conversion in both directions.

use crate::error::{ListingsError, ParseError, Result};
use chrono::NaiveDate;
use polars::prelude::*;

// =============================================================================
// Frame -> vectors
// =============================================================================

/// Read a column as optional strings, casting non-string dtypes.
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Read a numeric column as optional `f64`.
pub fn f64_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Read a numeric column as optional `i64`.
pub fn i64_values(df: &DataFrame, column: &str) -> Result<Vec<Option<i64>>> {
    let series = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

/// Read a `Date` column back into chrono dates.
pub fn date_values(df: &DataFrame, column: &str) -> Result<Vec<Option<NaiveDate>>> {
    let series = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::Date)?;
    Ok(series.date()?.as_date_iter().collect())
}

// =============================================================================
// Vectors -> frame
// =============================================================================

/// Build a polars `Date` series from chrono dates.
pub fn date_series(name: &str, dates: &[NaiveDate]) -> Series {
    Series::new(name.into(), dates)
}

/// Strictly cast a column to `dtype`, reporting unparseable values as a
/// [`ParseError::InvalidNumber`].
pub fn strict_numeric(df: &DataFrame, column: &str, dtype: &DataType) -> Result<Series> {
    let series = df.column(column)?.as_materialized_series();
    series.strict_cast(dtype).map_err(|e| {
        ListingsError::from(ParseError::InvalidNumber {
            column: column.to_string(),
            reason: e.to_string(),
        })
    })
}

/// Reject non-finite or negative values in a `Float64` series, and fractional
/// ones when `integral` is set. Nulls pass.
pub fn check_non_negative(series: &Series, column: &str, integral: bool) -> Result<()> {
    for (idx, value) in series.f64()?.into_iter().enumerate() {
        let Some(value) = value else {
            continue;
        };
        let problem = if !value.is_finite() {
            "is not finite"
        } else if value < 0.0 {
            "is negative"
        } else if integral && value.fract() != 0.0 {
            "is not a whole number"
        } else {
            continue;
        };
        return Err(ParseError::InvalidNumber {
            column: column.to_string(),
            reason: format!("row {}: {} {}", idx + 1, value, problem),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Misc
// =============================================================================

/// Count `None` entries.
pub fn count_missing<T>(values: &[Option<T>]) -> usize {
    values.iter().filter(|v| v.is_none()).count()
}

/// Distinct values in first-occurrence order, skipping nulls.
pub fn first_occurrence_unique(values: &[Option<String>]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .flatten()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}
