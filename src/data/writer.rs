//! Tab-delimited table and error-log writers.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::{QuoteStyle, WriterBuilder};
use thiserror::Error;

/// Errors that can occur while writing outputs.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write table '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, WriteError>;

/// Create the parent directory of `path` if needed.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| WriteError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    ensure_parent_dirs(path)?;
    let file = File::create(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

/// Write one value per line, substituting `error_token` for missing values.
pub fn write_lines(path: &Path, values: &[Option<String>], error_token: &str) -> Result<()> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = create_buffered_writer(path)?;
    for value in values {
        writeln!(writer, "{}", value.as_deref().unwrap_or(error_token)).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

/// Write rows as a tab-separated table with no quoting. Rows may differ
/// in length.
pub fn write_table<R, F>(path: &Path, rows: R) -> Result<()>
where
    R: IntoIterator<Item = Vec<F>>,
    F: AsRef<[u8]>,
{
    let csv_err = |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quote_style(QuoteStyle::Never)
        .from_writer(create_buffered_writer(path)?);

    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Bad lines collected per source file, for [`write_error_log`].
pub type BadLines = Vec<(PathBuf, Vec<(usize, String)>)>;

/// `error_log_{name}_{YYYYmmdd_HHMMSS}.txt`
pub fn error_log_name(name: &str, at: DateTime<Local>) -> String {
    format!("error_log_{}_{}.txt", name, at.format("%Y%m%d_%H%M%S"))
}

/// Write the bad lines of every file under a titled header. Files with no
/// bad lines are left out. Returns the log path, or `None` when there was
/// nothing to log.
pub fn write_error_log(
    output_dir: &Path,
    name: &str,
    errors: &BadLines,
    at: DateTime<Local>,
) -> Result<Option<PathBuf>> {
    if errors.iter().all(|(_, lines)| lines.is_empty()) {
        return Ok(None);
    }

    let path = output_dir.join(error_log_name(name, at));
    let io_err = |source| WriteError::Io {
        path: path.clone(),
        source,
    };
    let mut writer = create_buffered_writer(&path)?;

    writeln!(writer, "Error log - {name}").map_err(io_err)?;
    writeln!(writer, "{}", "=".repeat(50)).map_err(io_err)?;
    writeln!(writer).map_err(io_err)?;
    for (file, lines) in errors {
        if lines.is_empty() {
            continue;
        }
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        writeln!(writer, "\nFile: {file_name}").map_err(io_err)?;
        for (line_no, content) in lines {
            writeln!(writer, "Line {line_no}: {content}").map_err(io_err)?;
        }
    }
    writer.flush().map_err(io_err)?;

    Ok(Some(path))
}
