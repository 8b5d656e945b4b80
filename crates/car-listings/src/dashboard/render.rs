//! Plain-text rendering of dashboard views.

use super::histogram::{Histogram, Normalization};
use super::views::{ClassificationChart, DataTable};
use super::Dashboard;
use std::fmt;

/// Widest bar drawn for the largest value of a chart.
const BAR_WIDTH: usize = 40;
/// Cells longer than this are truncated in the data table.
const MAX_CELL_WIDTH: usize = 18;

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "USED CARS ADVERTISEMENTS")?;
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f)?;

        section(f, "DATA VIEWER")?;
        writeln!(f, "{}", self.table)?;

        section(
            f,
            &format!(
                "VEHICLE TYPES AND THEIR CLASSIFICATION BY AGE (type: {})",
                self.selection.vehicle_type
            ),
        )?;
        for entry in &self.legend {
            writeln!(f, "  {}", entry.description)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.classification)?;

        section(
            f,
            &format!("'condition' vs 'days_listed' (make: {})", self.selection.make),
        )?;
        writeln!(f, "{}", self.days_listed)?;

        section(
            f,
            &format!(
                "PRICE DISTRIBUTION: {} vs {}",
                self.selection.compare.0, self.selection.compare.1
            ),
        )?;
        write!(f, "{}", self.price)
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "-".repeat(40))
}

impl fmt::Display for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .min(MAX_CELL_WIDTH)
            })
            .collect();

        writeln!(f, "{}", table_line(&self.columns, &widths))?;
        writeln!(
            f,
            "{}",
            "-".repeat(widths.iter().sum::<usize>() + widths.len().saturating_sub(1))
        )?;
        for row in &self.rows {
            writeln!(f, "{}", table_line(row, &widths))?;
        }
        writeln!(f, "({} of {} rows shown)", self.rows.len(), self.total_rows)
    }
}

fn table_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", truncate_str(cell, *width), width = *width))
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for ClassificationChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bars.is_empty() {
            return writeln!(f, "  No listings of type '{}'", self.vehicle_type);
        }

        let max = self.bars.iter().map(|bar| bar.count).max().unwrap_or(0) as f64;
        let mut current = None;
        for bar in &self.bars {
            if current != Some(bar.classification) {
                writeln!(f, "  {}", bar.classification)?;
                current = Some(bar.classification);
            }
            writeln!(
                f,
                "    {:<16} {:>6} {}",
                truncate_str(&bar.make, 16),
                bar.count,
                draw_bar(bar.count as f64, max)
            )?;
        }
        writeln!(f, "  total: {}", self.total())
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bin_count() == 0 {
            return writeln!(f, "  No values for '{}'", self.column);
        }

        let max = self.max_value();
        for series in &self.series {
            writeln!(f, "  {} (n = {})", series.label, series.total)?;
            for (idx, value) in series.values.iter().enumerate() {
                let Some((start, end)) = self.bin_range(idx) else {
                    continue;
                };
                let amount = match self.normalization {
                    Normalization::Count => format!("{:>6}", *value as usize),
                    Normalization::Percent => format!("{:>5.1}%", value),
                };
                writeln!(
                    f,
                    "    [{:>10.1}, {:>10.1}) {} {}",
                    start,
                    end,
                    amount,
                    draw_bar(*value, max)
                )?;
            }
        }
        Ok(())
    }
}

fn draw_bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len)
}

/// Truncate a string to max length with ellipsis.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
