use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use csv::{ReaderBuilder, Trim};
use log::debug;
use regex::Regex;
use thiserror::Error;

use super::model::{parse_cell, Cell, CellError};

/// Errors raised while reading simulation or results files.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse table '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("'{path}' row {row}: threshold '{value}' is not a number")]
    Threshold {
        path: PathBuf,
        row: usize,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, LoadError>;

fn open_lines(path: &Path) -> Result<std::io::Lines<BufReader<File>>> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file).lines())
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError + '_ {
    move |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Whitespace column extraction
// ---------------------------------------------------------------------------

/// Number of whitespace-separated fields on the first line (0 when the
/// file is empty or the first line is blank).
pub fn first_line_width(path: &Path) -> Result<usize> {
    match open_lines(path)?.next() {
        Some(line) => Ok(line.map_err(io_err(path))?.split_whitespace().count()),
        None => Ok(0),
    }
}

/// Pick the 1-based `column` from every non-blank line. Lines that are too
/// short yield `None`.
pub fn read_column(path: &Path, column: usize) -> Result<Vec<Option<String>>> {
    let index = column.saturating_sub(1);
    let mut out = Vec::new();
    for line in open_lines(path)? {
        let line = line.map_err(io_err(path))?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(line.split_whitespace().nth(index).map(str::to_string));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Barfiber outputs
// ---------------------------------------------------------------------------

/// Identity of a barfiber output file, decoded from its name.
#[derive(Debug, Clone, PartialEq)]
pub struct BarfiberKey {
    /// Ground-motion record, e.g. `B3`.
    pub record: String,
    /// Fibre position along the section.
    pub position: f64,
}

fn position_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"barfiber([-.0-9]+)\.out$").expect("static pattern"))
}

/// Decode `S2_B3_IDA_8.5MPa_barfiber-18.8.out` into `("B3", -18.8)`.
pub fn parse_barfiber_name(name: &str) -> Option<BarfiberKey> {
    let record = name.split('_').nth(1)?;
    let caps = position_regex().captures(name)?;
    let position = caps[1].parse::<f64>().ok()?;
    Some(BarfiberKey {
        record: record.to_string(),
        position,
    })
}

/// Last-column scan of one barfiber file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastColumnScan {
    /// Largest |value| over all parsed lines.
    pub max_abs: Option<f64>,
    /// `(line_number, trimmed_line)` for lines whose last field is not a number.
    pub bad_lines: Vec<(usize, String)>,
}

/// Parse the last field of every non-blank line and track the max |value|.
pub fn max_abs_last_column(path: &Path) -> Result<LastColumnScan> {
    let mut scan = LastColumnScan::default();
    for (idx, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(io_err(path))?;
        let Some(last) = line.split_whitespace().last() else {
            continue;
        };
        match last.parse::<f64>() {
            Ok(v) => {
                let v = v.abs();
                if scan.max_abs.map_or(!v.is_nan(), |m| v > m) {
                    scan.max_abs = Some(v);
                }
            }
            Err(_) => {
                debug!("{}:{}: unparseable '{}'", path.display(), idx + 1, last);
                scan.bad_lines.push((idx + 1, line.trim().to_string()));
            }
        }
    }
    Ok(scan)
}

// ---------------------------------------------------------------------------
// Results tables
// ---------------------------------------------------------------------------

/// A tabulated results file: row labels plus one raw column per level.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    pub row_labels: Vec<String>,
    /// level label → raw cells; entries may be missing on short rows.
    pub columns: BTreeMap<String, Vec<Option<String>>>,
}

impl ResultsTable {
    /// Load a tab-separated results file. Header fields starting with `B`
    /// are mapped in order onto `levels`.
    pub fn load(path: &Path, levels: &[String]) -> Result<Self> {
        let csv_err = |source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let mut records = reader.records();
        let header = match records.next() {
            Some(rec) => rec.map_err(csv_err)?,
            None => return Err(LoadError::EmptyFile(path.to_path_buf())),
        };

        let level_columns: Vec<(String, usize)> = header
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with('B'))
            .map(|(i, _)| i)
            .zip(levels.iter())
            .map(|(i, level)| (level.clone(), i))
            .collect();

        let mut table = ResultsTable::default();
        for (level, _) in &level_columns {
            table.columns.insert(level.clone(), Vec::new());
        }

        for rec in records {
            let rec = rec.map_err(csv_err)?;
            if rec.iter().all(str::is_empty) {
                continue;
            }
            table
                .row_labels
                .push(rec.get(0).unwrap_or_default().to_string());
            for (level, idx) in &level_columns {
                if let Some(col) = table.columns.get_mut(level) {
                    col.push(rec.get(*idx).map(str::to_string));
                }
            }
        }

        Ok(table)
    }

    /// Raw cells of `level`, or `None` when the file has no such column.
    pub fn column(&self, level: &str) -> Option<&[Option<String>]> {
        self.columns.get(level).map(Vec::as_slice)
    }

    /// Row labels parsed as thresholds.
    pub fn thresholds(&self, path: &Path) -> Result<Vec<f64>> {
        self.row_labels
            .iter()
            .enumerate()
            .map(|(row, label)| {
                label.parse::<f64>().map_err(|_| LoadError::Threshold {
                    path: path.to_path_buf(),
                    row: row + 1,
                    value: label.clone(),
                })
            })
            .collect()
    }

    /// The `level` column as numeric cells; absent columns are all errors.
    pub fn cells(&self, level: &str) -> Vec<Cell> {
        match self.column(level) {
            Some(col) => col
                .iter()
                .map(|raw| raw.as_deref().map_or(Err(CellError::Parse), parse_cell))
                .collect(),
            None => vec![Err(CellError::Parse); self.row_labels.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn levels(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{:.1}g", i as f64 / 10.0)).collect()
    }

    #[test]
    fn test_read_column_marks_short_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.txt");
        fs::write(&path, "1 2 3\n\n  4\t5 6 \n7\n").unwrap();

        let col = read_column(&path, 2).unwrap();
        assert_eq!(col, vec![Some("2".to_string()), Some("5".to_string()), None]);
    }

    #[test]
    fn test_first_line_width() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.txt");
        fs::write(&path, "a b\tc\nd\n").unwrap();
        assert_eq!(first_line_width(&path).unwrap(), 3);

        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "").unwrap();
        assert_eq!(first_line_width(&empty).unwrap(), 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_column(Path::new("/nonexistent/in.txt"), 1).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_parse_barfiber_name() {
        assert_eq!(
            parse_barfiber_name("S2_B3_IDA_8.5MPa_barfiber-18.8.out"),
            Some(BarfiberKey {
                record: "B3".into(),
                position: -18.8
            })
        );
        assert_eq!(
            parse_barfiber_name("S2_B12_IDA_8.5MPa_barfiber70.out").map(|k| k.position),
            Some(70.0)
        );
        assert_eq!(parse_barfiber_name("S2_B3_IDA_8.5MPa_barfiber.out"), None);
        assert_eq!(parse_barfiber_name("barfiber10.out"), None);
    }

    #[test]
    fn test_max_abs_last_column_records_bad_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.out");
        fs::write(&path, "0.1 0.002\n0.2 -0.005\n\n0.3 nope\n0.4 0.001\n").unwrap();

        let scan = max_abs_last_column(&path).unwrap();
        assert_eq!(scan.max_abs, Some(0.005));
        assert_eq!(scan.bad_lines, vec![(4, "0.3 nope".to_string())]);
    }

    #[test]
    fn test_max_abs_none_when_nothing_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.out");
        fs::write(&path, "time strain\n").unwrap();

        let scan = max_abs_last_column(&path).unwrap();
        assert_eq!(scan.max_abs, None);
        assert_eq!(scan.bad_lines.len(), 1);
    }

    #[test]
    fn test_results_table_maps_b_columns_to_levels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.txt");
        fs::write(
            &path,
            "b\\a\tB1\tB2\tB3\n-31.0\t1.5\t2.5\t3.5\n0.0\t4.0\terror\n\n10.0\t7\t8\t9\n",
        )
        .unwrap();

        let table = ResultsTable::load(&path, &levels(2)).unwrap();
        assert_eq!(table.row_labels, vec!["-31.0", "0.0", "10.0"]);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(
            table.column("0.2g").unwrap(),
            &[Some("2.5".to_string()), Some("error".to_string()), Some("8".to_string())]
        );
        assert!(table.column("0.3g").is_none());

        assert_eq!(table.thresholds(&path).unwrap(), vec![-31.0, 0.0, 10.0]);
        assert_eq!(
            table.cells("0.2g"),
            vec![Ok(2.5), Err(CellError::Parse), Ok(8.0)]
        );
        assert_eq!(table.cells("1.7g"), vec![Err::<f64, _>(CellError::Parse); 3]);
    }

    #[test]
    fn test_results_table_short_row_and_bad_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.txt");
        fs::write(&path, "b\\a\tB1\tB2\nx\t1.0\n").unwrap();

        let table = ResultsTable::load(&path, &levels(17)).unwrap();
        assert_eq!(table.column("0.2g").unwrap(), &[None::<String>]);
        assert!(matches!(
            table.thresholds(&path),
            Err(LoadError::Threshold { row: 1, .. })
        ));
    }

    #[test]
    fn test_results_table_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.txt");
        fs::write(&path, "").unwrap();
        assert!(matches!(
            ResultsTable::load(&path, &levels(1)),
            Err(LoadError::EmptyFile(_))
        ));
    }
}
