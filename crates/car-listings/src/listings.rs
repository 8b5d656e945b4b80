//! The processed, read-only listing collection.

use crate::classifier::AgeClass;
use crate::error::{DashboardError, ListingsError, ParseError, Result};
use crate::types::{VehicleListing, columns};
use crate::utils::{date_values, f64_values, first_occurrence_unique, i64_values, string_values};
use polars::prelude::*;

/// Processed listings. Only read access is exposed, so a value can be
/// shared freely between views once the pipeline has produced it.
#[derive(Debug, Clone)]
pub struct Listings {
    frame: DataFrame,
}

static_assertions::assert_impl_all!(Listings: Send, Sync);

impl Listings {
    pub(crate) fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// The underlying frame.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Nulls remaining in `column`.
    pub fn null_count(&self, column: &str) -> Result<usize> {
        Ok(self.frame.column(column)?.null_count())
    }

    /// Distinct values of `column` in first-occurrence order.
    pub fn unique_values(&self, column: &str) -> Result<Vec<String>> {
        Ok(first_occurrence_unique(&string_values(&self.frame, column)?))
    }

    /// Distinct values of `column`, sorted.
    pub fn sorted_unique_values(&self, column: &str) -> Result<Vec<String>> {
        let mut values = self.unique_values(column)?;
        values.sort();
        Ok(values)
    }

    /// Fail with [`DashboardError::UnknownSelection`] unless `value` occurs in `column`.
    pub fn ensure_value(&self, column: &str, value: &str) -> Result<()> {
        if self.unique_values(column)?.iter().any(|v| v == value) {
            Ok(())
        } else {
            Err(DashboardError::UnknownSelection {
                column: column.to_string(),
                value: value.to_string(),
            }
            .into())
        }
    }

    /// Rows where `column == value`.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<DataFrame> {
        self.filter_in(column, &[value])
    }

    /// Rows where `column` equals any of `values`.
    pub fn filter_in(&self, column: &str, values: &[&str]) -> Result<DataFrame> {
        let predicate = values
            .iter()
            .map(|v| col(column).eq(lit(*v)))
            .reduce(|acc, expr| acc.or(expr));

        match predicate {
            Some(predicate) => Ok(self.frame.clone().lazy().filter(predicate).collect()?),
            None => Ok(self.frame.clear()),
        }
    }

    /// Materialize every row as a [`VehicleListing`], in input order.
    pub fn records(&self) -> Result<Vec<VehicleListing>> {
        records_of(&self.frame)
    }
}

/// Processed columns read out of the frame, one vector per field.
struct RecordColumns {
    price: Vec<Option<f64>>,
    model_year: Vec<Option<i64>>,
    model: Vec<Option<String>>,
    make: Vec<Option<String>>,
    condition: Vec<Option<String>>,
    cylinders: Vec<Option<f64>>,
    odometer: Vec<Option<f64>>,
    vehicle_type: Vec<Option<String>>,
    paint_color: Vec<Option<String>>,
    is_4wd: Vec<Option<i64>>,
    date_posted: Vec<Option<chrono::NaiveDate>>,
    days_listed: Vec<Option<i64>>,
    classification: Vec<Option<String>>,
}

impl RecordColumns {
    fn read(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            price: f64_values(df, columns::PRICE)?,
            model_year: i64_values(df, columns::MODEL_YEAR)?,
            model: string_values(df, columns::MODEL)?,
            make: string_values(df, columns::MAKE)?,
            condition: string_values(df, columns::CONDITION)?,
            cylinders: f64_values(df, columns::CYLINDERS)?,
            odometer: f64_values(df, columns::ODOMETER)?,
            vehicle_type: string_values(df, columns::TYPE)?,
            paint_color: string_values(df, columns::PAINT_COLOR)?,
            is_4wd: i64_values(df, columns::IS_4WD)?,
            date_posted: date_values(df, columns::DATE_POSTED)?,
            days_listed: i64_values(df, columns::DAYS_LISTED)?,
            classification: string_values(df, columns::CLASSIFICATION)?,
        })
    }

    /// Fails with [`ParseError::MissingValue`] if a field other than
    /// `paint_color` is null.
    fn row(&self, i: usize) -> Result<VehicleListing> {
        let classification = required(&self.classification, columns::CLASSIFICATION, i)?;
        Ok(VehicleListing {
            price: required(&self.price, columns::PRICE, i)?,
            model_year: required(&self.model_year, columns::MODEL_YEAR, i)?,
            model: required(&self.model, columns::MODEL, i)?,
            make: required(&self.make, columns::MAKE, i)?,
            condition: required(&self.condition, columns::CONDITION, i)?,
            cylinders: required(&self.cylinders, columns::CYLINDERS, i)?,
            odometer: required(&self.odometer, columns::ODOMETER, i)?,
            vehicle_type: required(&self.vehicle_type, columns::TYPE, i)?,
            paint_color: self.paint_color[i].clone(),
            is_4wd: required(&self.is_4wd, columns::IS_4WD, i)? != 0,
            date_posted: required(&self.date_posted, columns::DATE_POSTED, i)?,
            days_listed: required(&self.days_listed, columns::DAYS_LISTED, i)?,
            classification: AgeClass::from_label(&classification).ok_or_else(|| {
                ListingsError::from(ParseError::MissingValue {
                    column: columns::CLASSIFICATION.to_string(),
                    row: i + 1,
                })
            })?,
        })
    }
}

fn required<T: Clone>(values: &[Option<T>], column: &str, i: usize) -> Result<T> {
    values[i].clone().ok_or_else(|| {
        ParseError::MissingValue {
            column: column.to_string(),
            row: i + 1,
        }
        .into()
    })
}

fn records_of(df: &DataFrame) -> Result<Vec<VehicleListing>> {
    let table = RecordColumns::read(df)?;
    (0..df.height()).map(|i| table.row(i)).collect()
}
