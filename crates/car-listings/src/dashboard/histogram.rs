//! Equal-width histograms with shared bin edges across series.

use serde::{Deserialize, Serialize};

/// How series values are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Raw counts per bin.
    Count,
    /// Percentage of the series total per bin.
    Percent,
}

/// One colored series of a histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSeries {
    pub label: String,
    /// One value per bin, counts or percentages depending on normalization.
    pub values: Vec<f64>,
    /// Number of observations in the series.
    pub total: usize,
}

/// Several series binned over the same edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// The binned column.
    pub column: String,
    /// `bins + 1` ascending edges; empty when there is nothing to bin.
    pub edges: Vec<f64>,
    pub normalization: Normalization,
    pub series: Vec<HistogramSeries>,
}

impl Histogram {
    /// Bin every series over a common `[min, max]` range.
    ///
    /// The last bin is closed on the right so `max` is counted. A degenerate
    /// range gets a single bin of width 1.
    pub fn build(
        column: impl Into<String>,
        groups: Vec<(String, Vec<f64>)>,
        bins: usize,
        normalization: Normalization,
    ) -> Self {
        let edges = shared_edges(groups.iter().flat_map(|(_, values)| values), bins);

        let series = groups
            .into_iter()
            .map(|(label, values)| {
                let counts = bin_counts(&values, &edges);
                HistogramSeries {
                    label,
                    values: normalize(&counts, values.len(), normalization),
                    total: values.len(),
                }
            })
            .collect();

        Self {
            column: column.into(),
            edges,
            normalization,
            series,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// `(start, end)` of bin `idx`.
    pub fn bin_range(&self, idx: usize) -> Option<(f64, f64)> {
        Some((*self.edges.get(idx)?, *self.edges.get(idx + 1)?))
    }

    pub fn series(&self, label: &str) -> Option<&HistogramSeries> {
        self.series.iter().find(|s| s.label == label)
    }

    /// Largest value across all series and bins.
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

fn shared_edges<'a>(values: impl Iterator<Item = &'a f64>, bins: usize) -> Vec<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold(None, |range: Option<(f64, f64)>, &v| match range {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or((f64::NAN, f64::NAN));

    if min.is_nan() || bins == 0 {
        return Vec::new();
    }
    if (max - min).abs() < f64::EPSILON {
        return vec![min, min + 1.0];
    }

    let width = (max - min) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| min + i as f64 * width).collect();
    edges.push(max);
    edges
}

fn bin_counts(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let bin_count = edges.len().saturating_sub(1);
    let mut counts = vec![0usize; bin_count];
    if bin_count == 0 {
        return counts;
    }

    let min = edges[0];
    let width = (edges[bin_count] - min) / bin_count as f64;

    for value in values.iter().filter(|v| v.is_finite()) {
        let mut index = ((value - min) / width) as usize;
        if index >= bin_count {
            index = bin_count - 1;
        }
        counts[index] += 1;
    }
    counts
}

fn normalize(counts: &[usize], total: usize, normalization: Normalization) -> Vec<f64> {
    match normalization {
        Normalization::Count => counts.iter().map(|c| *c as f64).collect(),
        Normalization::Percent if total == 0 => vec![0.0; counts.len()],
        Normalization::Percent => counts
            .iter()
            .map(|c| *c as f64 * 100.0 / total as f64)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn group(label: &str, values: &[f64]) -> (String, Vec<f64>) {
        (label.to_string(), values.to_vec())
    }

    #[test]
    fn test_equal_width_edges() {
        let hist = Histogram::build(
            "price",
            vec![group("a", &[0.0, 10.0])],
            5,
            Normalization::Count,
        );
        assert_eq!(hist.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(hist.bin_count(), 5);
        assert_eq!(hist.bin_range(1), Some((2.0, 4.0)));
    }

    #[test]
    fn test_max_lands_in_last_bin() {
        let hist = Histogram::build(
            "price",
            vec![group("a", &[0.0, 5.0, 10.0])],
            2,
            Normalization::Count,
        );
        assert_eq!(hist.series[0].values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_series_share_edges() {
        let hist = Histogram::build(
            "price",
            vec![group("sedan", &[0.0, 1.0]), group("SUV", &[9.0, 10.0])],
            2,
            Normalization::Count,
        );
        assert_eq!(hist.edges, vec![0.0, 5.0, 10.0]);
        assert_eq!(hist.series("sedan").unwrap().values, vec![2.0, 0.0]);
        assert_eq!(hist.series("SUV").unwrap().values, vec![0.0, 2.0]);
    }

    #[test]
    fn test_percent_sums_to_100_per_series() {
        let hist = Histogram::build(
            "price",
            vec![
                group("sedan", &[1.0, 2.0, 3.0]),
                group("SUV", &[4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]),
            ],
            4,
            Normalization::Percent,
        );
        for series in &hist.series {
            let total: f64 = series.values.iter().sum();
            assert!((total - 100.0).abs() < 1e-9, "{}: {}", series.label, total);
        }
    }

    #[test]
    fn test_degenerate_range_single_bin() {
        let hist = Histogram::build(
            "days_listed",
            vec![group("good", &[7.0, 7.0, 7.0])],
            10,
            Normalization::Count,
        );
        assert_eq!(hist.edges, vec![7.0, 8.0]);
        assert_eq!(hist.series[0].values, vec![3.0]);
    }

    #[test]
    fn test_empty_selection_yields_empty_series() {
        let hist = Histogram::build(
            "price",
            vec![group("sedan", &[]), group("SUV", &[])],
            25,
            Normalization::Percent,
        );
        assert!(hist.edges.is_empty());
        assert_eq!(hist.series.len(), 2);
        assert!(hist.series.iter().all(|s| s.values.is_empty() && s.total == 0));
        assert_eq!(hist.max_value(), 0.0);
    }

    #[test]
    fn test_percent_with_one_empty_series() {
        let hist = Histogram::build(
            "price",
            vec![group("sedan", &[1.0, 3.0]), group("SUV", &[])],
            2,
            Normalization::Percent,
        );
        assert_eq!(hist.series("sedan").unwrap().values, vec![50.0, 50.0]);
        assert_eq!(hist.series("SUV").unwrap().values, vec![0.0, 0.0]);
    }
}
