//! Imputation of missing listing values.
//!
//! - [`group`]: the generic group-wise fill and its aggregations
//! - [`ListingImputer`]: the ordered per-field fills for the listings table

pub mod group;
mod listing;

pub use group::{
    Aggregate, GroupFill, GroupFillSpec, Mean, Median, MissingGroupPolicy, Mode,
    fill_missing_by_group,
};
pub use listing::{ImputedField, ListingImputer};
