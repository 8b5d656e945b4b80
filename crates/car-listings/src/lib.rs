//! Used-Car Listings Explorer
//!
//! Loads a used-car advertisement table, fills its missing values with
//! group-wise statistics, buckets every vehicle by age and builds a small
//! dashboard over the result.
//!
//! # Overview
//!
//! Data flows one way through the pipeline:
//!
//! - **Loading**: CSV reading, strict numeric conversion, `date_posted`
//!   parsing and `make` derivation ([`DataLoader`])
//! - **Imputation**: `model_year` by make mode, `cylinders` by type median,
//!   `odometer` by model-year mean, `paint_color` by make mode and `is_4wd`
//!   defaulting to 0 ([`ListingImputer`])
//! - **Classification**: six ordered age buckets from `model_year`
//!   ([`AgeClassifier`])
//! - **Dashboard**: data table, classification chart and histograms built
//!   from the read-only [`Listings`] ([`Dashboard`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use car_listings::{Dashboard, DashboardSelection, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder().price_bins(40).build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config.clone())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run_path("vehicles_us.csv")?;
//!
//! let selection = DashboardSelection::defaults_for(&result.listings)?;
//! let dashboard = Dashboard::build(&result.listings, &selection, &config)?;
//! println!("{dashboard}");
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`ListingsError`]. Malformed input is a
//! [`ParseError`]; a grouping key that is missing, or a group with nothing to
//! fill from, is an [`ImputationError`]. Residual `paint_color` gaps are
//! logged and reported in the [`ProcessingSummary`], never raised.

pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod imputers;
pub mod listings;
pub mod loader;
pub mod pipeline;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use classifier::{AgeClass, AgeClassifier, classify};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use dashboard::{
    ClassificationBar, ClassificationChart, Dashboard, DashboardSelection, DataTable, Histogram,
    HistogramSeries, Normalization, classification_by_make, days_listed_by_condition,
    price_by_type,
};
pub use error::{
    DashboardError, ImputationError, ListingsError, ParseError, Result as ListingsResult,
    ResultExt,
};
pub use imputers::{
    Aggregate, ImputedField, ListingImputer, Mean, Median, MissingGroupPolicy, Mode,
    fill_missing_by_group,
};
pub use listings::Listings;
pub use loader::{DataLoader, make_from_model};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineResult, PipelineStage,
    ProgressReporter, ProgressUpdate,
};
pub use types::{FieldFillReport, ProcessingSummary, VehicleListing, columns};
