//! Missing-value handling for the listings table.
//!
//! Fields are filled in a fixed order because later steps group by columns
//! that earlier steps complete: `model_year` is filled by make before it is
//! used as the key for `odometer`.

use super::group::{
    Aggregate, GroupFillSpec, Mean, Median, MissingGroupPolicy, Mode, fill_missing_by_group,
};
use crate::error::Result;
use crate::types::{FieldFillReport, columns};
use crate::utils::{count_missing, f64_values, i64_values, string_values};
use polars::prelude::*;
use tracing::{debug, info};

/// The fields the imputer fills, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputedField {
    ModelYear,
    Cylinders,
    Odometer,
    PaintColor,
    Is4wd,
}

impl ImputedField {
    pub const ORDER: [ImputedField; 5] = [
        ImputedField::ModelYear,
        ImputedField::Cylinders,
        ImputedField::Odometer,
        ImputedField::PaintColor,
        ImputedField::Is4wd,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::ModelYear => columns::MODEL_YEAR,
            Self::Cylinders => columns::CYLINDERS,
            Self::Odometer => columns::ODOMETER,
            Self::PaintColor => columns::PAINT_COLOR,
            Self::Is4wd => columns::IS_4WD,
        }
    }
}

/// Fills `model_year`, `cylinders`, `odometer`, `paint_color` and `is_4wd`.
pub struct ListingImputer;

impl ListingImputer {
    /// Run every fill in order, calling `on_field` after each one.
    pub fn impute_all(
        df: &mut DataFrame,
        processing_steps: &mut Vec<String>,
        mut on_field: impl FnMut(ImputedField, &FieldFillReport),
    ) -> Result<Vec<FieldFillReport>> {
        let mut reports = Vec::with_capacity(ImputedField::ORDER.len());
        for field in ImputedField::ORDER {
            let report = Self::impute_field(df, field, processing_steps)?;
            on_field(field, &report);
            reports.push(report);
        }
        Ok(reports)
    }

    /// Fill a single field.
    pub fn impute_field(
        df: &mut DataFrame,
        field: ImputedField,
        processing_steps: &mut Vec<String>,
    ) -> Result<FieldFillReport> {
        let report = match field {
            ImputedField::ModelYear => Self::impute_model_year(df)?,
            ImputedField::Cylinders => Self::impute_cylinders(df)?,
            ImputedField::Odometer => Self::impute_odometer(df)?,
            ImputedField::PaintColor => Self::impute_paint_color(df)?,
            ImputedField::Is4wd => Self::impute_is_4wd(df)?,
        };

        processing_steps.push(describe(&report));
        info!(
            "Imputed '{}': {} of {} missing value(s) filled",
            report.field, report.filled, report.missing_before
        );
        Ok(report)
    }

    /// `model_year`: mode per make, then coerced to integer.
    fn impute_model_year(df: &mut DataFrame) -> Result<FieldFillReport> {
        let keys = string_values(df, columns::MAKE)?;
        let years: Vec<Option<i64>> = f64_values(df, columns::MODEL_YEAR)?
            .into_iter()
            .map(|y| y.map(|y| y.round() as i64))
            .collect();

        let spec = GroupFillSpec {
            field: columns::MODEL_YEAR,
            key: columns::MAKE,
            policy: MissingGroupPolicy::Required,
        };
        let fill = fill_missing_by_group(spec, &keys, &years, &Mode)?;

        df.replace(
            columns::MODEL_YEAR,
            Series::new(columns::MODEL_YEAR.into(), fill.values),
        )?;

        Ok(report(
            spec,
            Aggregate::<i64>::name(&Mode),
            count_missing(&years),
            fill.filled,
            fill.unresolved,
        ))
    }

    /// `cylinders`: median per vehicle type.
    fn impute_cylinders(df: &mut DataFrame) -> Result<FieldFillReport> {
        let keys = string_values(df, columns::TYPE)?;
        Self::fill_numeric_by(
            df,
            GroupFillSpec {
                field: columns::CYLINDERS,
                key: columns::TYPE,
                policy: MissingGroupPolicy::Required,
            },
            &keys,
            &Median,
            |v| v,
        )
    }

    /// `odometer`: mean per model year, rounded half to even.
    fn impute_odometer(df: &mut DataFrame) -> Result<FieldFillReport> {
        let keys = i64_values(df, columns::MODEL_YEAR)?;
        Self::fill_numeric_by(
            df,
            GroupFillSpec {
                field: columns::ODOMETER,
                key: columns::MODEL_YEAR,
                policy: MissingGroupPolicy::Required,
            },
            &keys,
            &Mean,
            f64::round_ties_even,
        )
    }

    /// `paint_color`: mode per make; makes without any color stay missing.
    fn impute_paint_color(df: &mut DataFrame) -> Result<FieldFillReport> {
        let keys = string_values(df, columns::MAKE)?;
        let colors = string_values(df, columns::PAINT_COLOR)?;

        let spec = GroupFillSpec {
            field: columns::PAINT_COLOR,
            key: columns::MAKE,
            policy: MissingGroupPolicy::Permissive,
        };
        let fill = fill_missing_by_group(spec, &keys, &colors, &Mode)?;

        df.replace(
            columns::PAINT_COLOR,
            Series::new(columns::PAINT_COLOR.into(), fill.values),
        )?;

        Ok(report(
            spec,
            Aggregate::<String>::name(&Mode),
            count_missing(&colors),
            fill.filled,
            fill.unresolved,
        ))
    }

    /// `is_4wd`: missing means not four-wheel drive.
    fn impute_is_4wd(df: &mut DataFrame) -> Result<FieldFillReport> {
        let flags = f64_values(df, columns::IS_4WD)?;
        let missing = count_missing(&flags);

        let filled: Vec<i64> = flags
            .iter()
            .map(|flag| match flag {
                Some(v) if *v != 0.0 => 1,
                _ => 0,
            })
            .collect();
        df.replace(
            columns::IS_4WD,
            Series::new(columns::IS_4WD.into(), filled),
        )?;

        Ok(FieldFillReport {
            field: columns::IS_4WD.to_string(),
            group_key: None,
            method: "default 0".to_string(),
            missing_before: missing,
            filled: missing,
            unresolved_groups: Vec::new(),
        })
    }

    /// Shared path for the Float64 fields.
    fn fill_numeric_by<K, A>(
        df: &mut DataFrame,
        spec: GroupFillSpec<'_>,
        keys: &[Option<K>],
        aggregation: &A,
        finish: impl Fn(f64) -> f64,
    ) -> Result<FieldFillReport>
    where
        K: Eq + std::hash::Hash + Clone + std::fmt::Display,
        A: Aggregate<f64>,
    {
        let values = f64_values(df, spec.field)?;
        let fill = fill_missing_by_group(spec, keys, &values, aggregation)?;

        let finished: Vec<Option<f64>> = fill.values.iter().map(|v| v.map(&finish)).collect();
        df.replace(spec.field, Series::new(spec.field.into(), finished))?;

        debug!(
            "'{}' filled by '{}' {} ({} group(s) unresolved)",
            spec.field,
            spec.key,
            aggregation.name(),
            fill.unresolved.len()
        );

        Ok(report(
            spec,
            aggregation.name(),
            count_missing(&values),
            fill.filled,
            fill.unresolved,
        ))
    }
}

fn report(
    spec: GroupFillSpec<'_>,
    method: &str,
    missing_before: usize,
    filled: usize,
    unresolved_groups: Vec<String>,
) -> FieldFillReport {
    FieldFillReport {
        field: spec.field.to_string(),
        group_key: Some(spec.key.to_string()),
        method: method.to_string(),
        missing_before,
        filled,
        unresolved_groups,
    }
}

fn describe(report: &FieldFillReport) -> String {
    let mut step = match &report.group_key {
        Some(key) => format!(
            "Filled {} missing '{}' value(s) by '{}' {}",
            report.filled, report.field, key, report.method
        ),
        None => format!(
            "Filled {} missing '{}' value(s) with {}",
            report.filled, report.field, report.method
        ),
    };
    if !report.unresolved_groups.is_empty() {
        step.push_str(&format!(
            "; left {} missing in group(s) {}",
            report.missing_after(),
            report.unresolved_groups.join(", ")
        ));
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ImputationError, ListingsError};
    use pretty_assertions::assert_eq;

    /// A frame shaped like the loader output.
    fn listings_frame() -> DataFrame {
        df![
            "make" => ["ford", "ford", "ford", "toyota", "toyota"],
            "type" => ["truck", "truck", "truck", "sedan", "sedan"],
            "model_year" => [Some(2011.0), Some(2011.0), None, Some(2015.0), Some(2015.0)],
            "cylinders" => [Some(6.0), Some(8.0), None, Some(4.0), None],
            "odometer" => [Some(100.0), Some(200.0), None, Some(50_000.0), None],
            "paint_color" => [Some("blue"), Some("red"), None, None, None],
            "is_4wd" => [Some(1.0), None, Some(1.0), None, None],
        ]
        .unwrap()
    }

    #[test]
    fn test_impute_all_fills_in_order() {
        let mut df = listings_frame();
        let mut steps = Vec::new();
        let mut seen = Vec::new();

        let reports =
            ListingImputer::impute_all(&mut df, &mut steps, |field, _| seen.push(field)).unwrap();

        assert_eq!(seen, ImputedField::ORDER.to_vec());
        assert_eq!(reports.len(), 5);
        assert_eq!(steps.len(), 5);
    }

    #[test]
    fn test_model_year_mode_by_make_and_integer() {
        let mut df = listings_frame();
        let mut steps = Vec::new();

        ListingImputer::impute_field(&mut df, ImputedField::ModelYear, &mut steps).unwrap();

        assert_eq!(df.column("model_year").unwrap().dtype(), &DataType::Int64);
        let years = i64_values(&df, "model_year").unwrap();
        assert_eq!(years[2], Some(2011));
    }

    #[test]
    fn test_cylinders_median_by_type() {
        let mut df = listings_frame();
        let mut steps = Vec::new();

        let report =
            ListingImputer::impute_field(&mut df, ImputedField::Cylinders, &mut steps).unwrap();

        let cylinders = f64_values(&df, "cylinders").unwrap();
        assert_eq!(cylinders[2], Some(7.0));
        assert_eq!(cylinders[4], Some(4.0));
        assert_eq!(report.filled, 2);
        assert!(steps[0].contains("by 'type' median"));
    }

    #[test]
    fn test_odometer_mean_by_model_year_is_rounded() {
        let mut df = listings_frame();
        let mut steps = Vec::new();

        ListingImputer::impute_field(&mut df, ImputedField::ModelYear, &mut steps).unwrap();
        ListingImputer::impute_field(&mut df, ImputedField::Odometer, &mut steps).unwrap();

        let odometer = f64_values(&df, "odometer").unwrap();
        assert_eq!(odometer[2], Some(150.0));
        assert_eq!(odometer[4], Some(50_000.0));
    }

    #[test]
    fn test_odometer_rounds_half_to_even() {
        let mut df = df![
            "model_year" => [2012i64, 2012, 2012],
            "odometer" => [Some(1.0), Some(4.0), None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        ListingImputer::impute_field(&mut df, ImputedField::Odometer, &mut steps).unwrap();

        // mean 2.5 rounds to 2
        let odometer = f64_values(&df, "odometer").unwrap();
        assert_eq!(odometer[2], Some(2.0));
    }

    #[test]
    fn test_paint_color_leaves_colorless_make_missing() {
        let mut df = listings_frame();
        let mut steps = Vec::new();

        let report =
            ListingImputer::impute_field(&mut df, ImputedField::PaintColor, &mut steps).unwrap();

        let colors = string_values(&df, "paint_color").unwrap();
        assert_eq!(colors[2], Some("blue".to_string()));
        assert_eq!(colors[3], None);
        assert_eq!(colors[4], None);
        assert_eq!(report.unresolved_groups, vec!["toyota".to_string()]);
        assert_eq!(report.missing_after(), 2);
        assert!(steps[0].contains("toyota"));
    }

    #[test]
    fn test_is_4wd_defaults_to_zero() {
        let mut df = listings_frame();
        let mut steps = Vec::new();

        let report =
            ListingImputer::impute_field(&mut df, ImputedField::Is4wd, &mut steps).unwrap();

        let flags = i64_values(&df, "is_4wd").unwrap();
        assert_eq!(flags, vec![Some(1), Some(0), Some(1), Some(0), Some(0)]);
        assert_eq!(report.filled, 3);
        assert_eq!(report.group_key, None);
    }

    #[test]
    fn test_model_year_unresolved_make_is_fatal() {
        let mut df = df![
            "make" => ["ford", "ford", "toyota"],
            "model_year" => [Some(2011.0), None, None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let err =
            ListingImputer::impute_field(&mut df, ImputedField::ModelYear, &mut steps).unwrap_err();

        match err {
            ListingsError::Imputation(ImputationError::UnresolvedGroups { field, groups, .. }) => {
                assert_eq!(field, "model_year");
                assert_eq!(groups, vec!["toyota".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(steps.is_empty());
    }

    #[test]
    fn test_cylinders_missing_type_is_rejected() {
        let mut df = df![
            "type" => [Some("sedan"), None],
            "cylinders" => [Some(4.0), Some(6.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let err =
            ListingImputer::impute_field(&mut df, ImputedField::Cylinders, &mut steps).unwrap_err();

        assert_eq!(err.error_code(), "MISSING_GROUP_KEY");
    }
}
