use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Cell – one numeric entry, or the reason there is none
// ---------------------------------------------------------------------------

/// Why a cell carries no number. Both kinds render as the error token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CellError {
    /// The source text could not be converted to a number.
    #[error("value could not be parsed")]
    Parse,
    /// No row qualified for a reduction.
    #[error("no qualifying rows")]
    EmptyInput,
}

/// A single value in a data column.
pub type Cell = Result<f64, CellError>;

/// Parse one raw table field into a [`Cell`].
pub fn parse_cell(raw: &str) -> Cell {
    raw.trim().parse::<f64>().map_err(|_| CellError::Parse)
}

/// Render a cell for output, using `error_token` for the error variants.
pub fn render_cell(cell: &Cell, error_token: &str) -> String {
    match cell {
        Ok(v) => FloatText(*v).to_string(),
        Err(_) => error_token.to_string(),
    }
}

// ---------------------------------------------------------------------------
// FloatText – output formatting for floats
// ---------------------------------------------------------------------------

/// Shortest round-trip float text, keeping a trailing `.0` on integral
/// values so `-31` prints as `-31.0`.
#[derive(Debug, Clone, Copy)]
pub struct FloatText(pub f64);

impl fmt::Display for FloatText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_finite() && v.fract() == 0.0 {
            write!(f, "{v:.1}")
        } else if v.is_nan() {
            write!(f, "nan")
        } else if v.is_infinite() {
            write!(f, "{}", if v > 0.0 { "inf" } else { "-inf" })
        } else {
            write!(f, "{v}")
        }
    }
}

// ---------------------------------------------------------------------------
// Category / Dataset
// ---------------------------------------------------------------------------

/// One data column tagged with its numeric label.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub label: u32,
    pub values: Vec<Cell>,
}

impl Category {
    pub fn new(label: u32, values: Vec<Cell>) -> Self {
        Self { label, values }
    }
}

/// Threshold column plus every category aligned to it row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    thresholds: Vec<f64>,
    categories: Vec<Category>,
}

impl Dataset {
    /// Build a dataset, padding short columns with parse errors and
    /// truncating long ones so every column matches the thresholds.
    pub fn aligned(thresholds: Vec<f64>, categories: Vec<Category>) -> Self {
        let rows = thresholds.len();
        let categories = categories
            .into_iter()
            .map(|mut cat| {
                cat.values.resize(rows, Err(CellError::Parse));
                cat
            })
            .collect();
        Self {
            thresholds,
            categories,
        }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell(" 2.5 "), Ok(2.5));
        assert_eq!(parse_cell("-1e-3"), Ok(-0.001));
        assert_eq!(parse_cell("error"), Err(CellError::Parse));
        assert_eq!(parse_cell(""), Err(CellError::Parse));
    }

    #[test]
    fn test_float_text_keeps_integral_suffix() {
        assert_eq!(FloatText(-31.0).to_string(), "-31.0");
        assert_eq!(FloatText(0.0).to_string(), "0.0");
        assert_eq!(FloatText(-18.8).to_string(), "-18.8");
        assert_eq!(FloatText(1.5).to_string(), "1.5");
        assert_eq!(FloatText(1500.0).to_string(), "1500.0");
    }

    #[test]
    fn test_render_cell_uses_token() {
        assert_eq!(render_cell(&Ok(4.0), "error"), "4.0");
        assert_eq!(render_cell(&Err(CellError::EmptyInput), "error"), "error");
        assert_eq!(render_cell(&Err(CellError::Parse), "n/a"), "n/a");
    }

    #[test]
    fn test_dataset_aligns_columns() {
        let ds = Dataset::aligned(
            vec![0.0, 1.0, 2.0],
            vec![
                Category::new(100, vec![Ok(1.0)]),
                Category::new(200, vec![Ok(1.0), Ok(2.0), Ok(3.0), Ok(4.0)]),
            ],
        );
        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.categories()[0].values,
            vec![Ok(1.0), Err(CellError::Parse), Err(CellError::Parse)]
        );
        assert_eq!(ds.categories()[1].values.len(), 3);
    }
}
