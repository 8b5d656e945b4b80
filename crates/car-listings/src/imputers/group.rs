//! Group-wise fill of missing values.
//!
//! [`fill_missing_by_group`] partitions rows by a key column, computes one
//! statistic per group from the non-missing values, and writes it into the
//! missing slots of that group. The statistic is pluggable through
//! [`Aggregate`]; what happens to a group with nothing to aggregate is decided
//! by [`MissingGroupPolicy`].

use crate::error::ImputationError;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use tracing::{debug, warn};

/// What to do with a group whose values are all missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingGroupPolicy {
    /// Fail the fill with [`ImputationError::UnresolvedGroups`].
    Required,
    /// Leave the group's values missing.
    Permissive,
}

/// A statistic computed over the non-missing values of one group.
pub trait Aggregate<V> {
    /// Short name used in logs and processing steps.
    fn name(&self) -> &'static str;

    /// Aggregate `values`, which are in row order and never empty.
    fn aggregate(&self, values: &[V]) -> Option<V>;
}

/// Most frequent value. Ties go to the value that occurs first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mode;

/// Middle value; the mean of the two middle values for even counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Median;

/// Arithmetic mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl<V: Clone + PartialEq> Aggregate<V> for Mode {
    fn name(&self) -> &'static str {
        "mode"
    }

    fn aggregate(&self, values: &[V]) -> Option<V> {
        // (value, count) in first-occurrence order
        let mut tally: Vec<(&V, usize)> = Vec::new();
        for value in values {
            match tally.iter_mut().find(|(seen, _)| *seen == value) {
                Some((_, count)) => *count += 1,
                None => tally.push((value, 1)),
            }
        }

        let mut best: Option<(&V, usize)> = None;
        for (value, count) in tally {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((value, count));
            }
        }
        best.map(|(value, _)| value.clone())
    }
}

impl Aggregate<f64> for Median {
    fn name(&self) -> &'static str {
        "median"
    }

    fn aggregate(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}

impl Aggregate<f64> for Mean {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn aggregate(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Output of [`fill_missing_by_group`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFill<V> {
    /// Values in input row order, with resolvable gaps filled.
    pub values: Vec<Option<V>>,
    /// Number of slots that were filled.
    pub filled: usize,
    /// Keys of groups that had no value to aggregate, in first-occurrence order.
    /// Only non-empty under [`MissingGroupPolicy::Permissive`].
    pub unresolved: Vec<String>,
}

/// Names the field being filled and the column it is grouped by.
#[derive(Debug, Clone, Copy)]
pub struct GroupFillSpec<'a> {
    pub field: &'a str,
    pub key: &'a str,
    pub policy: MissingGroupPolicy,
}

/// Fill missing `values` with a per-group statistic keyed by `keys`.
///
/// `keys` and `values` are parallel slices in row order. A missing key is
/// rejected: rows are never grouped under an implicit "missing" key.
pub fn fill_missing_by_group<K, V, A>(
    spec: GroupFillSpec<'_>,
    keys: &[Option<K>],
    values: &[Option<V>],
    aggregation: &A,
) -> Result<GroupFill<V>, ImputationError>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
    A: Aggregate<V>,
{
    debug_assert_eq!(keys.len(), values.len());

    let missing_keys = keys.iter().filter(|k| k.is_none()).count();
    if missing_keys > 0 {
        return Err(ImputationError::MissingGroupKey {
            key: spec.key.to_string(),
            field: spec.field.to_string(),
            rows: missing_keys,
        });
    }

    // group index per row, groups in first-occurrence order
    let mut group_of: HashMap<&K, usize> = HashMap::new();
    let mut group_keys: Vec<&K> = Vec::new();
    let mut present: Vec<Vec<V>> = Vec::new();
    let mut needs_fill: Vec<bool> = Vec::new();
    let mut row_group = Vec::with_capacity(keys.len());

    for (key, value) in keys.iter().flatten().zip(values) {
        let idx = *group_of.entry(key).or_insert_with(|| {
            group_keys.push(key);
            present.push(Vec::new());
            needs_fill.push(false);
            group_keys.len() - 1
        });
        match value {
            Some(v) => present[idx].push(v.clone()),
            None => needs_fill[idx] = true,
        }
        row_group.push(idx);
    }

    let mut fills: Vec<Option<V>> = Vec::with_capacity(group_keys.len());
    let mut unresolved = Vec::new();
    for (idx, key) in group_keys.iter().enumerate() {
        let fill = if needs_fill[idx] && !present[idx].is_empty() {
            aggregation.aggregate(&present[idx])
        } else {
            None
        };
        if needs_fill[idx] && fill.is_none() {
            unresolved.push(key.to_string());
        }
        fills.push(fill);
    }

    if !unresolved.is_empty() {
        match spec.policy {
            MissingGroupPolicy::Required => {
                for group in &unresolved {
                    warn!(
                        "No '{}' value to derive a {} from in '{}' group '{}'",
                        spec.field,
                        aggregation.name(),
                        spec.key,
                        group
                    );
                }
                return Err(ImputationError::UnresolvedGroups {
                    field: spec.field.to_string(),
                    key: spec.key.to_string(),
                    groups: unresolved,
                });
            }
            MissingGroupPolicy::Permissive => {
                debug!(
                    "Leaving '{}' missing for {} '{}' group(s) without reference values",
                    spec.field,
                    unresolved.len(),
                    spec.key
                );
            }
        }
    }

    let mut filled = 0;
    let values = values
        .iter()
        .zip(row_group)
        .map(|(value, idx)| match value {
            Some(v) => Some(v.clone()),
            None => {
                let fill = fills[idx].clone();
                if fill.is_some() {
                    filled += 1;
                }
                fill
            }
        })
        .collect();

    Ok(GroupFill {
        values,
        filled,
        unresolved,
    })
}
