use crate::classifier::AgeClass;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names of the listings table.
pub mod columns {
    pub const PRICE: &str = "price";
    pub const MODEL_YEAR: &str = "model_year";
    pub const MODEL: &str = "model";
    pub const CONDITION: &str = "condition";
    pub const CYLINDERS: &str = "cylinders";
    pub const ODOMETER: &str = "odometer";
    pub const TYPE: &str = "type";
    pub const PAINT_COLOR: &str = "paint_color";
    pub const IS_4WD: &str = "is_4wd";
    pub const DATE_POSTED: &str = "date_posted";
    pub const DAYS_LISTED: &str = "days_listed";

    // derived
    pub const MAKE: &str = "make";
    pub const CLASSIFICATION: &str = "classification";

    /// Columns the input file must provide.
    pub const REQUIRED: [&str; 11] = [
        PRICE,
        MODEL_YEAR,
        MODEL,
        CONDITION,
        CYLINDERS,
        ODOMETER,
        TYPE,
        PAINT_COLOR,
        IS_4WD,
        DATE_POSTED,
        DAYS_LISTED,
    ];
}

/// One advertisement row after processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleListing {
    pub price: f64,
    pub model_year: i64,
    pub model: String,
    pub make: String,
    pub condition: String,
    pub cylinders: f64,
    pub odometer: f64,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    /// `None` only when no listing of the same make has a color.
    pub paint_color: Option<String>,
    pub is_4wd: bool,
    pub date_posted: NaiveDate,
    pub days_listed: i64,
    pub classification: AgeClass,
}

/// What one imputation step did to its field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFillReport {
    /// The imputed column.
    pub field: String,
    /// Grouping column, or `None` for a constant fill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    /// Statistic or constant used ("mode", "median", "mean", "default 0").
    pub method: String,
    pub missing_before: usize,
    pub filled: usize,
    /// Groups with no value to fill from (only ever non-empty for permissive fields).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_groups: Vec<String>,
}

impl FieldFillReport {
    pub fn missing_after(&self) -> usize {
        self.missing_before - self.filled
    }
}

/// Human-readable summary of a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    pub rows: usize,
    pub columns: usize,
    /// One entry per imputed field, in processing order.
    pub fills: Vec<FieldFillReport>,
    /// Non-fatal issues (e.g. residual missing paint colors).
    pub warnings: Vec<String>,
}

impl ProcessingSummary {
    pub fn total_filled(&self) -> usize {
        self.fills.iter().map(|f| f.filled).sum()
    }

    pub fn fill_for(&self, field: &str) -> Option<&FieldFillReport> {
        self.fills.iter().find(|f| f.field == field)
    }
}
