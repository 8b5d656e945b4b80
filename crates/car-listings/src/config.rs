//! Configuration for loading listings and building dashboard views.
//!
//! Use [`PipelineConfig::builder()`] for a validated configuration.

use serde::{Deserialize, Serialize};

/// Default `date_posted` format.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Configuration for the listings pipeline and the dashboard built on top of it.
///
/// # Example
///
/// ```rust,ignore
/// use car_listings::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .price_bins(40)
///     .table_preview_rows(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// chrono format string used to parse `date_posted`.
    /// Default: "%Y-%m-%d"
    pub date_format: String,

    /// Number of bins for the price-by-type histogram.
    /// Default: 25
    pub price_bins: usize,

    /// Number of bins for the days-listed-by-condition histogram.
    /// Default: 30
    pub days_listed_bins: usize,

    /// Rows shown in the data table view.
    /// Default: 20
    pub table_preview_rows: usize,

    /// Rows scanned by the CSV reader when inferring column types.
    /// Default: 10000
    pub infer_schema_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            price_bins: 25,
            days_listed_bins: 30,
            table_preview_rows: 20,
            infer_schema_length: 10_000,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.date_format.trim().is_empty() {
            return Err(ConfigValidationError::EmptyDateFormat);
        }

        if self.price_bins == 0 {
            return Err(ConfigValidationError::InvalidBinCount {
                field: "price_bins".to_string(),
            });
        }

        if self.days_listed_bins == 0 {
            return Err(ConfigValidationError::InvalidBinCount {
                field: "days_listed_bins".to_string(),
            });
        }

        if self.infer_schema_length == 0 {
            return Err(ConfigValidationError::InvalidSchemaLength);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Date format must not be empty")]
    EmptyDateFormat,

    #[error("Invalid bin count for '{field}' (must be at least 1)")]
    InvalidBinCount { field: String },

    #[error("Schema inference length must be at least 1")]
    InvalidSchemaLength,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    date_format: Option<String>,
    price_bins: Option<usize>,
    days_listed_bins: Option<usize>,
    table_preview_rows: Option<usize>,
    infer_schema_length: Option<usize>,
}

impl PipelineConfigBuilder {
    /// Set the chrono format used for `date_posted`.
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Set the number of bins for the price histogram.
    pub fn price_bins(mut self, bins: usize) -> Self {
        self.price_bins = Some(bins);
        self
    }

    /// Set the number of bins for the days-listed histogram.
    pub fn days_listed_bins(mut self, bins: usize) -> Self {
        self.days_listed_bins = Some(bins);
        self
    }

    /// Set how many rows the table view shows.
    pub fn table_preview_rows(mut self, rows: usize) -> Self {
        self.table_preview_rows = Some(rows);
        self
    }

    /// Set how many rows the CSV reader scans to infer column types.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            date_format: self.date_format.unwrap_or(defaults.date_format),
            price_bins: self.price_bins.unwrap_or(defaults.price_bins),
            days_listed_bins: self.days_listed_bins.unwrap_or(defaults.days_listed_bins),
            table_preview_rows: self
                .table_preview_rows
                .unwrap_or(defaults.table_preview_rows),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
        };

        config.validate()?;
        Ok(config)
    }
}
