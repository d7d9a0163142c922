use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::loader::{LoadError, ResultsTable};
use super::model::{render_cell, Category, Dataset, FloatText};
use super::reduce::Reduction;

/// Corner label of every tabulated output.
pub const CORNER: &str = "b\\a";

// ---------------------------------------------------------------------------
// Barfiber results table
// ---------------------------------------------------------------------------

/// Order ground-motion records by their numeric suffix (`B2 < B10`).
/// Records without one sort after, by text.
pub fn record_order(a: &str, b: &str) -> Ordering {
    fn suffix(s: &str) -> Option<i64> {
        s.get(1..).and_then(|rest| rest.parse().ok())
    }
    match (suffix(a), suffix(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Position × record grid of scaled max strains.
#[derive(Debug, Clone, Default)]
pub struct StrainGrid {
    // keyed by position bits so f64 can live in a map; order comes from `rows()`
    cells: BTreeMap<(u64, String), f64>,
    positions: Vec<f64>,
    records: BTreeSet<String>,
}

impl StrainGrid {
    pub fn insert(&mut self, position: f64, record: &str, value: f64) {
        if !self.positions.iter().any(|p| p.to_bits() == position.to_bits()) {
            self.positions.push(position);
        }
        self.records.insert(record.to_string());
        self.cells
            .insert((position.to_bits(), record.to_string()), value);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Header plus one row per position (ascending), one column per record.
    pub fn rows(&self, error_token: &str) -> Vec<Vec<String>> {
        let mut records: Vec<&String> = self.records.iter().collect();
        records.sort_by(|a, b| record_order(a, b));
        let mut positions = self.positions.clone();
        positions.sort_by(f64::total_cmp);

        let mut rows = Vec::with_capacity(positions.len() + 1);
        let mut header = vec![CORNER.to_string()];
        header.extend(records.iter().map(|r| r.to_string()));
        rows.push(header);

        for pos in positions {
            let mut row = vec![FloatText(pos).to_string()];
            for record in &records {
                row.push(
                    self.cells
                        .get(&(pos.to_bits(), record.to_string()))
                        .map(|v| FloatText(*v).to_string())
                        .unwrap_or_else(|| error_token.to_string()),
                );
            }
            rows.push(row);
        }
        rows
    }
}

// ---------------------------------------------------------------------------
// Results-file derived tables
// ---------------------------------------------------------------------------

/// One category's results file, already loaded.
#[derive(Debug, Clone)]
pub struct CategoryTable<'a> {
    pub label: u32,
    pub path: &'a Path,
    pub table: &'a ResultsTable,
}

/// Rows of `strain_distribution_{level}`: row labels of the first table,
/// one column per category holding its raw `level` value.
pub fn distribution_rows(
    tables: &[CategoryTable<'_>],
    level: &str,
    error_token: &str,
) -> Vec<Vec<String>> {
    let Some(first) = tables.first() else {
        return Vec::new();
    };

    let mut header = vec![CORNER.to_string()];
    header.extend(tables.iter().map(|t| t.label.to_string()));
    let mut rows = vec![header];

    for (idx, row_label) in first.table.row_labels.iter().enumerate() {
        let mut row = vec![row_label.clone()];
        for t in tables {
            let raw = t
                .table
                .column(level)
                .and_then(|col| col.get(idx))
                .and_then(|cell| cell.as_deref());
            row.push(raw.unwrap_or(error_token).to_string());
        }
        rows.push(row);
    }
    rows
}

/// Build the reducer input for `level`: thresholds from the first table's
/// row labels, one category per table.
pub fn level_dataset(tables: &[CategoryTable<'_>], level: &str) -> Result<Dataset, LoadError> {
    let Some(first) = tables.first() else {
        return Ok(Dataset::aligned(Vec::new(), Vec::new()));
    };
    let thresholds = first.table.thresholds(first.path)?;
    let categories = tables
        .iter()
        .map(|t| Category::new(t.label, t.table.cells(level)))
        .collect();
    Ok(Dataset::aligned(thresholds, categories))
}

/// Rows of `max_strain_{level}`: `label, upper, lower` per category.
pub fn max_strain_rows(reduction: &Reduction, error_token: &str) -> Vec<Vec<String>> {
    reduction
        .upper
        .iter()
        .zip(&reduction.lower)
        .map(|((label, upper), (_, lower))| {
            vec![
                label.to_string(),
                render_cell(upper, error_token),
                render_cell(lower, error_token),
            ]
        })
        .collect()
}
