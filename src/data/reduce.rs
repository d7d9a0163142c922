use super::model::{Category, Cell, CellError, Dataset};

// ---------------------------------------------------------------------------
// Threshold extremum reduction
// ---------------------------------------------------------------------------

/// Per-category results in category order: `(label, result)`.
pub type LabelledResults = Vec<(u32, Cell)>;

/// Output of [`reduce`]: one result sequence per ordering predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// Max over rows where `threshold * 10 <= label`.
    pub lower: LabelledResults,
    /// Max over rows where `label <= threshold * 10`.
    pub upper: LabelledResults,
}

/// Reduce every category to its maximum value on each side of the label.
///
/// Rows are paired by index; a category is scanned only as far as both
/// sequences reach. Errors never win a maximum. A side with no qualifying
/// row yields [`CellError::EmptyInput`]; a side whose qualifying rows are
/// all errors yields [`CellError::Parse`].
pub fn reduce(thresholds: &[f64], categories: &[Category]) -> Reduction {
    let mut lower = Vec::with_capacity(categories.len());
    let mut upper = Vec::with_capacity(categories.len());

    for cat in categories {
        let label = f64::from(cat.label);
        lower.push((
            cat.label,
            max_where(thresholds, &cat.values, |scaled| scaled <= label),
        ));
        upper.push((
            cat.label,
            max_where(thresholds, &cat.values, |scaled| label <= scaled),
        ));
    }

    Reduction { lower, upper }
}

/// [`reduce`] over an already aligned [`Dataset`].
pub fn reduce_dataset(dataset: &Dataset) -> Reduction {
    reduce(dataset.thresholds(), dataset.categories())
}

fn max_where(thresholds: &[f64], values: &[Cell], keep: impl Fn(f64) -> bool) -> Cell {
    let mut qualified = false;
    let mut best: Option<f64> = None;

    for (&threshold, value) in thresholds.iter().zip(values) {
        if !keep(threshold * 10.0) {
            continue;
        }
        qualified = true;
        if let Ok(v) = *value {
            // NaN never compares greater, so it cannot become the maximum.
            if best.map_or(!v.is_nan(), |b| v > b) {
                best = Some(v);
            }
        }
    }

    match best {
        Some(v) => Ok(v),
        None if qualified => Err(CellError::Parse),
        None => Err(CellError::EmptyInput),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(label: u32, values: &[Cell]) -> Category {
        Category::new(label, values.to_vec())
    }

    const ERR: Cell = Err(CellError::Parse);

    #[test]
    fn test_reduce_splits_rows_at_label() {
        // scaled thresholds: -310, -188, 0, 100
        let thresholds = [-31.0, -18.8, 0.0, 10.0];
        let r = reduce(&thresholds, &[cat(20, &[Ok(1.0), Ok(2.0), ERR, Ok(4.0)])]);

        assert_eq!(r.lower, vec![(20, Ok(2.0))]);
        assert_eq!(r.upper, vec![(20, Ok(4.0))]);
    }

    #[test]
    fn test_boundary_row_counts_on_both_sides() {
        let thresholds = [0.0, 30.0, 60.0];
        let r = reduce(&thresholds, &[cat(300, &[Ok(1.0), Ok(9.0), Ok(5.0)])]);

        assert_eq!(r.lower, vec![(300, Ok(9.0))]);
        assert_eq!(r.upper, vec![(300, Ok(9.0))]);
    }

    #[test]
    fn test_single_error_row_yields_error_both_sides() {
        let r = reduce(&[5.0], &[cat(50, &[ERR])]);
        assert!(r.lower[0].1.is_err());
        assert!(r.upper[0].1.is_err());
    }

    #[test]
    fn test_all_error_column_yields_error() {
        let thresholds = [-31.0, 0.0, 10.0, 70.0];
        let r = reduce(&thresholds, &[cat(400, &[ERR, ERR, ERR, ERR])]);
        assert_eq!(r.lower[0].1, Err(CellError::Parse));
        assert_eq!(r.upper[0].1, Err(CellError::Parse));
    }

    #[test]
    fn test_no_qualifying_row_is_empty_input() {
        // Every scaled threshold is above 100.
        let r = reduce(&[20.0, 30.0], &[cat(100, &[Ok(1.0), Ok(2.0)])]);
        assert_eq!(r.lower[0].1, Err(CellError::EmptyInput));
        assert_eq!(r.upper[0].1, Ok(2.0));
    }

    #[test]
    fn test_empty_category_sequence() {
        let r = reduce(&[1.0, 2.0], &[cat(100, &[])]);
        assert_eq!(r.lower, vec![(100, Err(CellError::EmptyInput))]);
        assert_eq!(r.upper, vec![(100, Err(CellError::EmptyInput))]);
    }

    #[test]
    fn test_empty_mapping_returns_empty_sequences() {
        let r = reduce(&[1.0, 2.0, 3.0], &[]);
        assert!(r.lower.is_empty());
        assert!(r.upper.is_empty());
    }

    #[test]
    fn test_negative_values_and_nan() {
        let thresholds = [0.0, 1.0, 2.0];
        let r = reduce(
            &thresholds,
            &[cat(100, &[Ok(f64::NAN), Ok(-3.0), Ok(-1.5)])],
        );
        assert_eq!(r.lower[0].1, Ok(-1.5));

        let only_nan = reduce(&[0.0], &[cat(100, &[Ok(f64::NAN)])]);
        assert_eq!(only_nan.lower[0].1, Err(CellError::Parse));
    }

    #[test]
    fn test_categories_keep_input_order() {
        let thresholds = [0.0, 50.0];
        let r = reduce(
            &thresholds,
            &[cat(700, &[Ok(1.0), Ok(2.0)]), cat(100, &[Ok(3.0), Ok(4.0)])],
        );
        let labels: Vec<u32> = r.lower.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec![700, 100]);
        assert_eq!(r.upper[1], (100, Ok(4.0)));
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let thresholds = vec![-31.0, -18.8, 0.0, 10.0, 20.0, 30.0, 40.0];
        let a = vec![Ok(0.4), ERR, Ok(1.2), Ok(0.9), Ok(3.1), ERR, Ok(2.2)];
        let b = vec![Ok(5.0), Ok(1.0), ERR, Ok(7.5), Ok(0.1), Ok(2.0), Ok(6.0)];
        let forward = reduce(&thresholds, &[cat(200, &a), cat(300, &b)]);

        let perm = [4, 0, 6, 2, 5, 1, 3];
        let pick = |col: &[Cell]| perm.iter().map(|&i| col[i]).collect::<Vec<_>>();
        let shuffled_thresholds: Vec<f64> = perm.iter().map(|&i| thresholds[i]).collect();
        let shuffled = reduce(
            &shuffled_thresholds,
            &[cat(200, &pick(&a)), cat(300, &pick(&b))],
        );

        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_reduce_dataset_matches_reduce() {
        let ds = Dataset::aligned(vec![0.0, 10.0], vec![cat(100, &[Ok(1.0)])]);
        let r = reduce_dataset(&ds);
        assert_eq!(r.lower, vec![(100, Ok(1.0))]);
        assert_eq!(r.upper, vec![(100, Err(CellError::Parse))]);
    }
}
