//! Dashboard views over processed listings.
//!
//! A [`Dashboard`] holds the four views shown to the user: the data table,
//! the classification-by-make bar chart, the days-listed histogram and the
//! price comparison histogram. Views are plain serializable data; text
//! rendering lives in [`render`].

pub mod histogram;
pub mod render;
mod views;

pub use histogram::{Histogram, HistogramSeries, Normalization};
pub use views::{
    ClassificationBar, ClassificationChart, DataTable, classification_by_make,
    days_listed_by_condition, price_by_type,
};

use crate::classifier::AgeClass;
use crate::config::PipelineConfig;
use crate::error::{DashboardError, Result};
use crate::listings::Listings;
use crate::types::columns;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Types preselected for the price comparison when present.
const DEFAULT_COMPARE: (&str, &str) = ("sedan", "SUV");

/// User choices that parameterize the views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSelection {
    /// Vehicle type for the classification chart.
    pub vehicle_type: String,
    /// Make for the days-listed histogram.
    pub make: String,
    /// The two vehicle types compared in the price histogram.
    pub compare: (String, String),
    /// Express price histograms as percentages.
    pub normalize: bool,
}

impl DashboardSelection {
    /// The selection a fresh dashboard starts with.
    ///
    /// Type and make are the first values seen in the data. The comparison
    /// pair is sedan/SUV when both exist, otherwise the first two types in
    /// sorted order.
    pub fn defaults_for(listings: &Listings) -> Result<Self> {
        let vehicle_type = first_value(listings, columns::TYPE)?;
        let make = first_value(listings, columns::MAKE)?;

        let sorted_types = listings.sorted_unique_values(columns::TYPE)?;
        let has = |t: &str| sorted_types.iter().any(|v| v == t);
        let compare = if has(DEFAULT_COMPARE.0) && has(DEFAULT_COMPARE.1) {
            (DEFAULT_COMPARE.0.to_string(), DEFAULT_COMPARE.1.to_string())
        } else {
            let first = sorted_types
                .first()
                .cloned()
                .unwrap_or_else(|| vehicle_type.clone());
            let second = sorted_types.get(1).cloned().unwrap_or_else(|| first.clone());
            (first, second)
        };

        Ok(Self {
            vehicle_type,
            make,
            compare,
            normalize: true,
        })
    }

    /// Reject values that do not occur in the listings.
    pub fn validate(&self, listings: &Listings) -> Result<()> {
        listings.ensure_value(columns::TYPE, &self.vehicle_type)?;
        listings.ensure_value(columns::MAKE, &self.make)?;
        listings.ensure_value(columns::TYPE, &self.compare.0)?;
        listings.ensure_value(columns::TYPE, &self.compare.1)?;
        Ok(())
    }
}

fn first_value(listings: &Listings, column: &str) -> Result<String> {
    listings
        .unique_values(column)?
        .into_iter()
        .next()
        .ok_or_else(|| DashboardError::EmptyColumn(column.to_string()).into())
}

/// Legend line for one age bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub classification: AgeClass,
    pub description: String,
}

/// Every view of the dashboard for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub selection: DashboardSelection,
    pub table: DataTable,
    pub classification: ClassificationChart,
    pub legend: Vec<LegendEntry>,
    pub days_listed: Histogram,
    pub price: Histogram,
}

impl Dashboard {
    /// Build all views. Fails if the selection names a type or make that
    /// does not occur in the listings.
    pub fn build(
        listings: &Listings,
        selection: &DashboardSelection,
        config: &PipelineConfig,
    ) -> Result<Self> {
        selection.validate(listings)?;

        let table = DataTable::preview(listings, config.table_preview_rows)?;
        let classification = classification_by_make(listings, &selection.vehicle_type)?;
        let days_listed = days_listed_by_condition(listings, &selection.make, config.days_listed_bins)?;
        let price = price_by_type(
            listings,
            &selection.compare.0,
            &selection.compare.1,
            config.price_bins,
            selection.normalize,
        )?;

        let legend = AgeClass::ALL
            .iter()
            .map(|class| LegendEntry {
                classification: *class,
                description: class.year_range_description().to_string(),
            })
            .collect();

        info!(
            "Built dashboard: type '{}', make '{}', comparing '{}' vs '{}'",
            selection.vehicle_type, selection.make, selection.compare.0, selection.compare.1
        );

        Ok(Self {
            selection: selection.clone(),
            table,
            classification,
            legend,
            days_listed,
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn listings(types: &[&str]) -> Listings {
        let n = types.len();
        let makes: Vec<&str> = ["kia", "audi", "kia", "ram"].iter().cycle().take(n).copied().collect();
        let frame = df![
            "price" => (0..n).map(|i| 1000.0 * (i + 1) as f64).collect::<Vec<_>>(),
            "type" => types.to_vec(),
            "make" => makes,
            "condition" => vec!["good"; n],
            "days_listed" => (0..n as i64).collect::<Vec<_>>(),
            "classification" => vec!["modern"; n],
        ]
        .unwrap();
        Listings::new(frame)
    }

    #[test]
    fn test_defaults_prefer_sedan_and_suv() {
        let selection =
            DashboardSelection::defaults_for(&listings(&["pickup", "SUV", "coupe", "sedan"])).unwrap();

        assert_eq!(selection.vehicle_type, "pickup");
        assert_eq!(selection.make, "kia");
        assert_eq!(selection.compare, ("sedan".to_string(), "SUV".to_string()));
        assert!(selection.normalize);
    }

    #[test]
    fn test_defaults_fall_back_to_sorted_types() {
        let selection =
            DashboardSelection::defaults_for(&listings(&["van", "pickup", "coupe"])).unwrap();
        assert_eq!(
            selection.compare,
            ("coupe".to_string(), "pickup".to_string())
        );
    }

    #[test]
    fn test_defaults_with_single_type() {
        let selection = DashboardSelection::defaults_for(&listings(&["van", "van"])).unwrap();
        assert_eq!(selection.compare, ("van".to_string(), "van".to_string()));
    }

    #[test]
    fn test_defaults_on_empty_listings() {
        let err = DashboardSelection::defaults_for(&listings(&[])).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_COLUMN");
    }

    #[test]
    fn test_build_uses_config() {
        let listings = listings(&["sedan", "SUV", "sedan", "SUV"]);
        let selection = DashboardSelection::defaults_for(&listings).unwrap();
        let config = PipelineConfig::builder()
            .price_bins(3)
            .days_listed_bins(2)
            .table_preview_rows(1)
            .build()
            .unwrap();

        let dashboard = Dashboard::build(&listings, &selection, &config).unwrap();

        assert_eq!(dashboard.table.rows.len(), 1);
        assert_eq!(dashboard.price.bin_count(), 3);
        assert_eq!(dashboard.days_listed.bin_count(), 2);
        assert_eq!(dashboard.legend.len(), AgeClass::ALL.len());
        assert_eq!(dashboard.price.normalization, Normalization::Percent);
    }

    #[test]
    fn test_build_rejects_unknown_make() {
        let listings = listings(&["sedan", "SUV"]);
        let mut selection = DashboardSelection::defaults_for(&listings).unwrap();
        selection.make = "tesla".to_string();

        let err = Dashboard::build(&listings, &selection, &PipelineConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_SELECTION");
    }
}
