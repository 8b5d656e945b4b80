//! Age-bucket classification of listings by model year.

use crate::error::Result;
use crate::types::columns;
use crate::utils::i64_values;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Age bucket of a vehicle, ordered from newest to oldest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeClass {
    NearlyNew,
    LateModel,
    Modern,
    Classic,
    Antique,
    Vintage,
}

/// Lower bound (inclusive) of each band, checked top to bottom.
/// Anything below the last bound is [`AgeClass::Vintage`].
const BANDS: [(i64, AgeClass); 5] = [
    (2017, AgeClass::NearlyNew),
    (2009, AgeClass::LateModel),
    (2000, AgeClass::Modern),
    (1974, AgeClass::Classic),
    (1931, AgeClass::Antique),
];

impl AgeClass {
    /// All labels in legend order.
    pub const ALL: [AgeClass; 6] = [
        AgeClass::NearlyNew,
        AgeClass::LateModel,
        AgeClass::Modern,
        AgeClass::Classic,
        AgeClass::Antique,
        AgeClass::Vintage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearlyNew => "nearly_new",
            Self::LateModel => "late_model",
            Self::Modern => "modern",
            Self::Classic => "classic",
            Self::Antique => "antique",
            Self::Vintage => "vintage",
        }
    }

    /// Legend text shown next to the classification chart.
    pub fn year_range_description(&self) -> &'static str {
        match self {
            Self::NearlyNew => "Nearly new: Cars from 2017 onwards",
            Self::LateModel => "Late model: Cars from 2009 to 2016",
            Self::Modern => "Modern: Cars from 2000 to 2008",
            Self::Classic => "Classic: Cars from 1974 to 1999",
            Self::Antique => "Antique: Cars from 1931 to 1973",
            Self::Vintage => "Vintage: Any cars from before 1931",
        }
    }

    /// Parse a snake_case label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.as_str() == label)
    }
}

impl fmt::Display for AgeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a model year. Total over `i64`.
pub fn classify(model_year: i64) -> AgeClass {
    BANDS
        .iter()
        .find(|(lower, _)| model_year >= *lower)
        .map(|(_, class)| *class)
        .unwrap_or(AgeClass::Vintage)
}

/// Adds the `classification` column derived from `model_year`.
pub struct AgeClassifier;

impl AgeClassifier {
    /// Append a `classification` column to `df`.
    ///
    /// Expects `model_year` to be fully imputed. A null year yields a null label.
    pub fn apply(df: &mut DataFrame, processing_steps: &mut Vec<String>) -> Result<()> {
        let years = i64_values(df, columns::MODEL_YEAR)?;
        let labels: Vec<Option<&'static str>> = years
            .iter()
            .map(|year| year.map(|y| classify(y).as_str()))
            .collect();

        let mut counts = [0usize; 6];
        for year in years.iter().flatten() {
            let class = classify(*year);
            if let Some(idx) = AgeClass::ALL.iter().position(|c| *c == class) {
                counts[idx] += 1;
            }
        }
        for (class, count) in AgeClass::ALL.iter().zip(counts) {
            debug!("{}: {} listing(s)", class, count);
        }

        df.with_column(Series::new(columns::CLASSIFICATION.into(), labels))?;
        processing_steps.push(format!(
            "Classified {} listings into {} age buckets",
            years.len(),
            counts.iter().filter(|c| **c > 0).count()
        ));

        Ok(())
    }
}
