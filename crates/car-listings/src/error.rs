//! Error types for loading, imputing and presenting listings.
//!
//! Errors are split by stage: [`ParseError`] aborts the load,
//! [`ImputationError`] aborts processing, and [`DashboardError`] rejects a
//! selection that does not match the data. [`ListingsError`] wraps all of
//! them and is serializable so the CLI can print it in `--json` mode.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// Failures while reading the input table into a frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A required column is absent from the header.
    #[error("Required column '{0}' not found in input")]
    MissingColumn(String),

    /// A `date_posted` value did not match the configured format.
    #[error("Row {row}: invalid date '{value}' (expected format '{format}')")]
    InvalidDate {
        row: usize,
        value: String,
        format: String,
    },

    /// The `model` field is null or blank, so no make can be derived.
    #[error("Row {row}: 'model' is missing or empty")]
    MissingModel { row: usize },

    /// A column that is never imputed has a null or blank value.
    #[error("Row {row}: '{column}' is missing")]
    MissingValue { column: String, row: usize },

    /// A numeric column holds a value that is not a number, or one out of
    /// range for the column.
    #[error("Column '{column}' has an invalid number: {reason}")]
    InvalidNumber { column: String, reason: String },
}

/// Failures while filling missing values group-wise.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImputationError {
    /// The grouping column itself contains nulls.
    #[error("Cannot impute '{field}': grouping key '{key}' is missing in {rows} row(s)")]
    MissingGroupKey {
        key: String,
        field: String,
        rows: usize,
    },

    /// One or more groups have no value to derive a fill from.
    #[error("Cannot impute '{field}': no reference value in '{key}' group(s) {}", .groups.join(", "))]
    UnresolvedGroups {
        field: String,
        key: String,
        groups: Vec<String>,
    },
}

/// Failures while building dashboard views.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("Unknown {column} '{value}'")]
    UnknownSelection { column: String, value: String },

    #[error("Dataset has no values in column '{0}'")]
    EmptyColumn(String),
}

/// Top-level error for the listings pipeline.
#[derive(Error, Debug)]
pub enum ListingsError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Imputation(#[from] ImputationError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ListingsError>,
    },
}

impl ListingsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ListingsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(ParseError::MissingColumn(_)) => "MISSING_COLUMN",
            Self::Parse(ParseError::InvalidDate { .. }) => "INVALID_DATE",
            Self::Parse(ParseError::MissingModel { .. }) => "MISSING_MODEL",
            Self::Parse(ParseError::MissingValue { .. }) => "MISSING_VALUE",
            Self::Parse(ParseError::InvalidNumber { .. }) => "INVALID_NUMBER",
            Self::Imputation(ImputationError::MissingGroupKey { .. }) => "MISSING_GROUP_KEY",
            Self::Imputation(ImputationError::UnresolvedGroups { .. }) => "UNRESOLVED_GROUPS",
            Self::Dashboard(DashboardError::UnknownSelection { .. }) => "UNKNOWN_SELECTION",
            Self::Dashboard(DashboardError::EmptyColumn(_)) => "EMPTY_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True for errors raised while reading the input table.
    pub fn is_parse_error(&self) -> bool {
        match self {
            Self::Parse(_) => true,
            Self::WithContext { source, .. } => source.is_parse_error(),
            _ => false,
        }
    }

    /// True for errors raised while filling missing values.
    pub fn is_imputation_error(&self) -> bool {
        match self {
            Self::Imputation(_) => true,
            Self::WithContext { source, .. } => source.is_imputation_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as `{ code, message }`.
impl Serialize for ListingsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ListingsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for listings operations.
pub type Result<T> = std::result::Result<T, ListingsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ListingsError::Polars(e).with_context(context))
    }
}
