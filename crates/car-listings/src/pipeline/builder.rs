//! The load → impute → classify pipeline.

use crate::classifier::AgeClassifier;
use crate::config::PipelineConfig;
use crate::error::{ListingsError, Result};
use crate::imputers::{ImputedField, ListingImputer};
use crate::listings::Listings;
use crate::loader::DataLoader;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{ProcessingSummary, columns};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Output of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The processed, read-only listings.
    pub listings: Listings,
    /// One line per action taken, in order.
    pub processing_steps: Vec<String>,
    pub summary: ProcessingSummary,
}

/// Runs the listings pipeline once over an input.
///
/// Use [`Pipeline::builder()`] to configure it.
///
/// # Example
///
/// ```rust,ignore
/// use car_listings::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .on_progress(|update| println!("{}", update.message))
///     .build()?
///     .run_path("vehicles_us.csv")?;
///
/// println!("{} listings", result.listings.len());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    loader: DataLoader,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a CSV file and process it.
    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<PipelineResult> {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Reading {}", path.as_ref().display()),
        ));
        let raw = self.loader.read_path(path).inspect_err(|e| self.fail(e))?;
        self.process(raw)
    }

    /// Process CSV text.
    pub fn run_str(&self, csv: &str) -> Result<PipelineResult> {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            "Reading CSV input",
        ));
        let raw = self.loader.read_str(csv).inspect_err(|e| self.fail(e))?;
        self.process(raw)
    }

    /// Process a raw frame as read from CSV.
    pub fn process(&self, raw: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(raw) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Processed {} listings",
                    result.listings.len()
                )));
                Ok(result)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn fail(&self, e: &ListingsError) {
        error!("Pipeline error: {}", e);
        self.report_progress(ProgressUpdate::failed(e.to_string()));
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, raw: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let mut processing_steps = Vec::new();

        // Step 1: validate, parse dates, derive make
        let mut df = self.loader.prepare(raw)?;
        processing_steps.push(format!(
            "Loaded {} listings; derived 'make' from 'model'",
            df.height()
        ));
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} listings", df.height()),
        ));

        // Step 2: fill missing values
        info!("Imputing missing values...");
        let total = ImputedField::ORDER.len();
        let mut done = 0;
        let fills = ListingImputer::impute_all(&mut df, &mut processing_steps, |field, report| {
            done += 1;
            self.report_progress(ProgressUpdate::with_items(
                PipelineStage::Imputation,
                done,
                total,
                format!("Filled {} '{}' value(s)", report.filled, field.column()),
            ));
        })?;

        // Step 3: age buckets
        AgeClassifier::apply(&mut df, &mut processing_steps)?;
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Classification,
            1.0,
            "Classification complete",
        ));

        let mut warnings = Vec::new();
        for fill in fills.iter().filter(|f| !f.unresolved_groups.is_empty()) {
            let message = format!(
                "{} '{}' value(s) left missing: no reference value for {} '{}'",
                fill.missing_after(),
                fill.field,
                fill.group_key.as_deref().unwrap_or("group"),
                fill.unresolved_groups.join(", ")
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let summary = ProcessingSummary {
            duration_ms: start_time.elapsed().as_millis() as u64,
            rows: df.height(),
            columns: df.width(),
            fills,
            warnings,
        };

        info!(
            "Pipeline finished in {}ms: {} listings, {} value(s) imputed",
            summary.duration_ms,
            summary.rows,
            summary.total_filled()
        );

        debug_assert_eq!(
            df.column(columns::CLASSIFICATION)
                .map(|c| c.null_count())
                .unwrap_or(0),
            0
        );

        Ok(PipelineResult {
            listings: Listings::new(df),
            processing_steps,
            summary,
        })
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a closure to receive progress updates.
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter(Arc::new(ClosureProgressReporter::new(callback)))
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            loader: DataLoader::new(&config),
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
