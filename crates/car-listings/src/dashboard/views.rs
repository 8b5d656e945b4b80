//! Read-only views over processed listings.

use super::histogram::{Histogram, Normalization};
use crate::classifier::AgeClass;
use crate::error::Result;
use crate::listings::Listings;
use crate::types::columns;
use crate::utils::{f64_values, first_occurrence_unique, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// The first rows of the listings, rendered as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    /// Row-major cells; nulls are empty strings.
    pub rows: Vec<Vec<String>>,
    /// Row count of the whole collection.
    pub total_rows: usize,
}

impl DataTable {
    pub fn preview(listings: &Listings, rows: usize) -> Result<Self> {
        let head = listings.frame().head(Some(rows));
        let columns: Vec<String> = head
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut cells = Vec::with_capacity(columns.len());
        for name in &columns {
            cells.push(string_values(&head, name)?);
        }

        let rows = (0..head.height())
            .map(|i| {
                cells
                    .iter()
                    .map(|column| column[i].clone().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self {
            columns,
            rows,
            total_rows: listings.len(),
        })
    }
}

/// One bar segment of the classification chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationBar {
    pub classification: AgeClass,
    pub make: String,
    pub count: usize,
}

/// Listings of one vehicle type counted per age bucket and make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationChart {
    pub vehicle_type: String,
    /// Buckets in [`AgeClass::ALL`] order, makes in first-occurrence order.
    pub bars: Vec<ClassificationBar>,
}

impl ClassificationChart {
    pub fn total(&self) -> usize {
        self.bars.iter().map(|bar| bar.count).sum()
    }

    /// Summed count per bucket, zero buckets included.
    pub fn class_totals(&self) -> Vec<(AgeClass, usize)> {
        AgeClass::ALL
            .iter()
            .map(|class| {
                let total = self
                    .bars
                    .iter()
                    .filter(|bar| bar.classification == *class)
                    .map(|bar| bar.count)
                    .sum();
                (*class, total)
            })
            .collect()
    }
}

/// Count listings of `vehicle_type` per (classification, make).
pub fn classification_by_make(listings: &Listings, vehicle_type: &str) -> Result<ClassificationChart> {
    listings.ensure_value(columns::TYPE, vehicle_type)?;
    let subset = listings.filter_eq(columns::TYPE, vehicle_type)?;

    let classes = string_values(&subset, columns::CLASSIFICATION)?;
    let makes = string_values(&subset, columns::MAKE)?;

    let mut counts: HashMap<(AgeClass, &str), usize> = HashMap::new();
    for (class, make) in classes.iter().zip(&makes) {
        if let (Some(class), Some(make)) = (class.as_deref().and_then(AgeClass::from_label), make) {
            *counts.entry((class, make.as_str())).or_default() += 1;
        }
    }

    let make_order = first_occurrence_unique(&makes);
    let mut bars = Vec::new();
    for class in AgeClass::ALL {
        for make in &make_order {
            if let Some(count) = counts.get(&(class, make.as_str())) {
                bars.push(ClassificationBar {
                    classification: class,
                    make: make.clone(),
                    count: *count,
                });
            }
        }
    }

    debug!(
        "Classification chart for '{}': {} listing(s) in {} bar(s)",
        vehicle_type,
        subset.height(),
        bars.len()
    );

    Ok(ClassificationChart {
        vehicle_type: vehicle_type.to_string(),
        bars,
    })
}

/// `days_listed` of one make, one series per condition.
pub fn days_listed_by_condition(listings: &Listings, make: &str, bins: usize) -> Result<Histogram> {
    listings.ensure_value(columns::MAKE, make)?;
    let subset = listings.filter_eq(columns::MAKE, make)?;

    let groups = group_values(&subset, columns::CONDITION, columns::DAYS_LISTED)?;
    Ok(Histogram::build(
        columns::DAYS_LISTED,
        groups,
        bins,
        Normalization::Count,
    ))
}

/// Overlaid `price` histogram of two vehicle types.
pub fn price_by_type(
    listings: &Listings,
    type_a: &str,
    type_b: &str,
    bins: usize,
    normalize: bool,
) -> Result<Histogram> {
    listings.ensure_value(columns::TYPE, type_a)?;
    listings.ensure_value(columns::TYPE, type_b)?;
    let subset = listings.filter_in(columns::TYPE, &[type_a, type_b])?;

    let types = string_values(&subset, columns::TYPE)?;
    let prices = f64_values(&subset, columns::PRICE)?;
    let prices_of = |wanted: &str| -> Vec<f64> {
        types
            .iter()
            .zip(&prices)
            .filter(|(t, _)| t.as_deref() == Some(wanted))
            .filter_map(|(_, price)| *price)
            .collect()
    };

    let normalization = if normalize {
        Normalization::Percent
    } else {
        Normalization::Count
    };
    Ok(Histogram::build(
        columns::PRICE,
        vec![
            (type_a.to_string(), prices_of(type_a)),
            (type_b.to_string(), prices_of(type_b)),
        ],
        bins,
        normalization,
    ))
}

/// Split `value_column` by `label_column`, labels in first-occurrence order.
fn group_values(
    df: &DataFrame,
    label_column: &str,
    value_column: &str,
) -> Result<Vec<(String, Vec<f64>)>> {
    let labels = string_values(df, label_column)?;
    let values = f64_values(df, value_column)?;

    let mut groups: Vec<(String, Vec<f64>)> = first_occurrence_unique(&labels)
        .into_iter()
        .map(|label| (label, Vec::new()))
        .collect();

    for (label, value) in labels.iter().zip(values) {
        let (Some(label), Some(value)) = (label, value) else {
            continue;
        };
        if let Some((_, bucket)) = groups.iter_mut().find(|(l, _)| l == label) {
            bucket.push(value);
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn listings() -> Listings {
        let frame = df![
            "price" => [1000.0, 2000.0, 3000.0, 4000.0, 5000.0, 6000.0],
            "type" => ["sedan", "SUV", "sedan", "sedan", "SUV", "pickup"],
            "make" => ["ford", "ford", "toyota", "ford", "bmw", "ram"],
            "condition" => ["good", "excellent", "good", "fair", "good", "good"],
            "days_listed" => [10i64, 20, 30, 40, 50, 60],
            "classification" => ["late_model", "modern", "late_model", "nearly_new", "late_model", "classic"],
        ]
        .unwrap();
        Listings::new(frame)
    }

    #[test]
    fn test_data_table_preview() {
        let table = DataTable::preview(&listings(), 2).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.total_rows, 6);
        assert_eq!(table.columns[1], "type");
        assert_eq!(table.rows[1][2], "ford");
    }

    #[test]
    fn test_classification_by_make_orders_and_counts() {
        let chart = classification_by_make(&listings(), "sedan").unwrap();

        let summary: Vec<(AgeClass, &str, usize)> = chart
            .bars
            .iter()
            .map(|b| (b.classification, b.make.as_str(), b.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                (AgeClass::NearlyNew, "ford", 1),
                (AgeClass::LateModel, "ford", 1),
                (AgeClass::LateModel, "toyota", 1),
            ]
        );
        assert_eq!(chart.total(), 3);
        assert_eq!(chart.class_totals()[1], (AgeClass::LateModel, 2));
    }

    #[test]
    fn test_classification_unknown_type() {
        let err = classification_by_make(&listings(), "convertible").unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_SELECTION");
    }

    #[test]
    fn test_days_listed_by_condition() {
        let hist = days_listed_by_condition(&listings(), "ford", 3).unwrap();

        let labels: Vec<&str> = hist.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["good", "excellent", "fair"]);
        assert_eq!(hist.edges, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(hist.series("good").unwrap().values, vec![1.0, 0.0, 0.0]);
        assert_eq!(hist.series("fair").unwrap().values, vec![0.0, 0.0, 1.0]);
        assert_eq!(hist.normalization, Normalization::Count);
    }

    #[test]
    fn test_price_by_type_normalized() {
        let hist = price_by_type(&listings(), "sedan", "SUV", 4, true).unwrap();

        assert_eq!(hist.series.len(), 2);
        assert_eq!(hist.series[0].label, "sedan");
        assert_eq!(hist.series[0].total, 3);
        assert_eq!(hist.series[1].total, 2);
        for series in &hist.series {
            let sum: f64 = series.values.iter().sum();
            assert!((sum - 100.0).abs() < 1e-9);
        }
        // pickup excluded from the shared range
        assert_eq!(hist.edges.last(), Some(&5000.0));
    }

    #[test]
    fn test_price_by_type_counts() {
        let hist = price_by_type(&listings(), "sedan", "SUV", 4, false).unwrap();
        let sedan: f64 = hist.series("sedan").unwrap().values.iter().sum();
        assert_eq!(sedan, 3.0);
    }

    #[test]
    fn test_price_by_type_unknown_type() {
        let err = price_by_type(&listings(), "sedan", "hatchback", 4, true).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_SELECTION");
    }
}
