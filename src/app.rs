use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use log::{debug, info, warn};

use crate::config::Config;
use crate::data::loader::{
    first_line_width, max_abs_last_column, parse_barfiber_name, read_column, ResultsTable,
};
use crate::data::reduce::reduce_dataset;
use crate::data::tabulate::{
    distribution_rows, level_dataset, max_strain_rows, CategoryTable, StrainGrid,
};
use crate::data::writer::{write_error_log, write_lines, write_table, BadLines};
use crate::request::{BarfiberRequest, ExtractRequest, ExtractTarget, StrainRequest};

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Per-file outcome counts of a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// One line per failed or skipped file.
    pub messages: Vec<String>,
    pub outputs: Vec<PathBuf>,
}

impl BatchSummary {
    fn fail(&mut self, input: &Path, why: impl std::fmt::Display) {
        warn!("{}: {}", input.display(), why);
        self.failed += 1;
        self.messages.push(format!("{}: {}", display_name(input), why));
    }

    fn skip(&mut self, input: &Path, why: impl std::fmt::Display) {
        info!("{}: skipped, {}", input.display(), why);
        self.skipped += 1;
        self.messages
            .push(format!("{}: skipped, {}", display_name(input), why));
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

// ---------------------------------------------------------------------------
// extract-column
// ---------------------------------------------------------------------------

/// Copy one column out of every input.
pub fn extract_columns(req: &ExtractRequest, config: &Config) -> BatchSummary {
    let mut summary = BatchSummary::default();
    let column = req.column();

    match req.target() {
        ExtractTarget::File(output) => {
            for input in req.inputs() {
                match extract_one(input, output, column, config) {
                    Ok(()) => {
                        summary.succeeded += 1;
                        summary.outputs.push(output.clone());
                    }
                    Err(e) => summary.fail(input, format!("{e:#}")),
                }
            }
        }
        ExtractTarget::Directory(dir) => {
            for input in req.inputs() {
                let width = match first_line_width(input) {
                    Ok(w) => w,
                    Err(e) => {
                        summary.fail(input, e);
                        continue;
                    }
                };
                if column > width {
                    summary.fail(input, format!("max columns {width}"));
                    continue;
                }

                let output = dir.join(format!("{}_column_{}.txt", file_stem(input), column));
                if output.exists() && !req.overwrite() {
                    summary.skip(input, format!("{} exists", display_name(&output)));
                    continue;
                }

                match extract_one(input, &output, column, config) {
                    Ok(()) => {
                        summary.succeeded += 1;
                        summary.outputs.push(output);
                    }
                    Err(e) => summary.fail(input, format!("{e:#}")),
                }
            }
        }
    }

    summary
}

fn extract_one(input: &Path, output: &Path, column: usize, config: &Config) -> Result<()> {
    let values = read_column(input, column)?;
    write_lines(output, &values, &config.error_token)?;
    info!(
        "{} -> {} ({} lines)",
        input.display(),
        output.display(),
        values.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// barfiber
// ---------------------------------------------------------------------------

/// Tabulate every requested folder into `{folder}_results.txt`.
pub fn tabulate_barfiber(req: &BarfiberRequest, config: &Config) -> Result<BatchSummary> {
    let pattern = config.barfiber_regex()?;
    let mut summary = BatchSummary::default();

    for folder in req.folders() {
        let name = display_name(folder);
        let mut grid = StrainGrid::default();
        let mut bad_lines: BadLines = Vec::new();

        let mut entries: Vec<PathBuf> = match fs::read_dir(folder) {
            Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(e) => {
                summary.fail(folder, e);
                continue;
            }
        };
        entries.sort();

        for path in entries {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !pattern.is_match(file_name) {
                continue;
            }
            let Some(key) = parse_barfiber_name(file_name) else {
                debug!("{file_name}: no record/position in name");
                continue;
            };

            let scan = match max_abs_last_column(&path) {
                Ok(scan) => scan,
                Err(e) => {
                    warn!("{e}");
                    continue;
                }
            };
            if !scan.bad_lines.is_empty() {
                bad_lines.push((path.clone(), scan.bad_lines));
            }
            if let Some(max_abs) = scan.max_abs {
                grid.insert(key.position, &key.record, max_abs * config.strain_scale);
            }
        }

        if grid.is_empty() {
            summary.fail(folder, "no matching barfiber files could be processed");
            continue;
        }

        let output = req.output_dir().join(format!("{name}_results.txt"));
        if let Err(e) = write_table(&output, grid.rows(&config.error_token)) {
            summary.fail(folder, format!("writing results: {e:#}"));
            continue;
        }
        info!("{} -> {}", folder.display(), output.display());
        summary.outputs.push(output);

        match write_error_log(req.output_dir(), &name, &bad_lines, chrono::Local::now()) {
            Ok(Some(log_path)) => {
                warn!("unparseable lines in {name}, see {}", log_path.display());
                summary.outputs.push(log_path);
            }
            Ok(None) => {}
            Err(e) => {
                summary.fail(folder, format!("writing error log: {e:#}"));
                continue;
            }
        }
        summary.succeeded += 1;
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// strain-distribution / max-strain
// ---------------------------------------------------------------------------

/// The first file supplies the row labels and must load. Any other file
/// that fails to load becomes an empty table, so its column is all errors.
fn load_tables(req: &StrainRequest, config: &Config) -> Result<Vec<ResultsTable>> {
    let mut tables = Vec::with_capacity(req.files().len());
    for (idx, (label, path)) in req.files().iter().enumerate() {
        let table = match ResultsTable::load(path, &config.levels) {
            Ok(table) => table,
            Err(e) if idx > 0 => {
                warn!("category {label}: {e}, column will be {}", config.error_token);
                ResultsTable::default()
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("loading results for category {label}")))
            }
        };
        tables.push(table);
    }
    Ok(tables)
}

fn category_tables<'a>(
    req: &'a StrainRequest,
    tables: &'a [ResultsTable],
) -> Vec<CategoryTable<'a>> {
    req.files()
        .iter()
        .zip(tables)
        .map(|((label, path), table)| CategoryTable {
            label: *label,
            path,
            table,
        })
        .collect()
}

/// Write `strain_distribution_{level}.txt` for every requested level.
pub fn strain_distribution(req: &StrainRequest, config: &Config) -> Result<Vec<PathBuf>> {
    let tables = load_tables(req, config)?;
    let tables = category_tables(req, &tables);
    if tables[0].table.row_labels.is_empty() {
        bail!("{} has no data rows", tables[0].path.display());
    }

    let mut outputs = Vec::with_capacity(req.levels().len());
    for level in req.levels() {
        let output = req
            .output_dir()
            .join(format!("strain_distribution_{level}.txt"));
        write_table(&output, distribution_rows(&tables, level, &config.error_token))?;
        info!("wrote {}", output.display());
        outputs.push(output);
    }
    Ok(outputs)
}

/// Write `max_strain_{level}.txt` for every requested level.
pub fn max_strain(req: &StrainRequest, config: &Config) -> Result<Vec<PathBuf>> {
    let tables = load_tables(req, config)?;
    let tables = category_tables(req, &tables);

    let mut outputs = Vec::with_capacity(req.levels().len());
    for level in req.levels() {
        let dataset = level_dataset(&tables, level)?;
        if dataset.is_empty() {
            warn!("{level}: no threshold rows, every result will be {}", config.error_token);
        }
        debug!("{level}: {} rows x {} categories", dataset.len(), dataset.categories().len());
        let reduction = reduce_dataset(&dataset);
        for ((label, upper), (_, lower)) in reduction.upper.iter().zip(&reduction.lower) {
            if upper.is_err() || lower.is_err() {
                debug!("{level} category {label}: upper {upper:?}, lower {lower:?}");
            }
        }

        let output = req.output_dir().join(format!("max_strain_{level}.txt"));
        write_table(&output, max_strain_rows(&reduction, &config.error_token))?;
        info!("wrote {}", output.display());
        outputs.push(output);
    }
    Ok(outputs)
}
