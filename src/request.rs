use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Config;

// ---------------------------------------------------------------------------
// Requests – validated, immutable inputs to each tool
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("column number must be at least 1")]
    InvalidColumn,

    #[error("no input files given")]
    NoInputs,

    #[error("--output-file takes exactly one input, got {0}")]
    SingleOutputNeedsOneInput(usize),

    #[error("no folders given")]
    NoFolders,

    #[error("no category files given")]
    NoCategories,

    #[error("category {0} is not one of the configured categories")]
    UnknownCategory(u32),

    #[error("category {0} was given more than once")]
    DuplicateCategory(u32),

    #[error("no levels selected")]
    NoLevels,

    #[error("level '{0}' is not one of the configured levels")]
    UnknownLevel(String),

    #[error("expected CATEGORY=PATH, got '{0}'")]
    BadPair(String),
}

/// Where extracted columns go.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractTarget {
    /// `{stem}_column_{N}.txt` per input inside this directory.
    Directory(PathBuf),
    /// A single input written straight to this file.
    File(PathBuf),
}

/// Column extraction over one or more whitespace-delimited files.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    column: usize,
    inputs: Vec<PathBuf>,
    target: ExtractTarget,
    overwrite: bool,
}

impl ExtractRequest {
    pub fn new(
        column: usize,
        inputs: Vec<PathBuf>,
        target: ExtractTarget,
        overwrite: bool,
    ) -> Result<Self, RequestError> {
        if column < 1 {
            return Err(RequestError::InvalidColumn);
        }
        if inputs.is_empty() {
            return Err(RequestError::NoInputs);
        }
        if matches!(target, ExtractTarget::File(_)) && inputs.len() != 1 {
            return Err(RequestError::SingleOutputNeedsOneInput(inputs.len()));
        }
        Ok(Self {
            column,
            inputs,
            target,
            overwrite,
        })
    }

    /// 1-based column number.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn target(&self) -> &ExtractTarget {
        &self.target
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }
}

/// Barfiber tabulation over one or more simulation folders.
#[derive(Debug, Clone)]
pub struct BarfiberRequest {
    folders: Vec<PathBuf>,
    output_dir: PathBuf,
}

impl BarfiberRequest {
    pub fn new(folders: Vec<PathBuf>, output_dir: PathBuf) -> Result<Self, RequestError> {
        if folders.is_empty() {
            return Err(RequestError::NoFolders);
        }
        Ok(Self {
            folders,
            output_dir,
        })
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Results files paired with their category, plus the levels to emit.
///
/// Categories and levels are held in configured order regardless of the
/// order they were given in.
#[derive(Debug, Clone)]
pub struct StrainRequest {
    files: Vec<(u32, PathBuf)>,
    levels: Vec<String>,
    output_dir: PathBuf,
}

impl StrainRequest {
    pub fn new(
        files: Vec<(u32, PathBuf)>,
        levels: Vec<String>,
        output_dir: PathBuf,
        config: &Config,
    ) -> Result<Self, RequestError> {
        if files.is_empty() {
            return Err(RequestError::NoCategories);
        }
        if levels.is_empty() {
            return Err(RequestError::NoLevels);
        }

        let mut ordered_files = Vec::with_capacity(files.len());
        for (label, path) in files {
            let rank = config
                .categories
                .iter()
                .position(|c| *c == label)
                .ok_or(RequestError::UnknownCategory(label))?;
            if ordered_files.iter().any(|(_, l, _)| *l == label) {
                return Err(RequestError::DuplicateCategory(label));
            }
            ordered_files.push((rank, label, path));
        }
        ordered_files.sort_by_key(|(rank, _, _)| *rank);

        let mut ordered_levels = Vec::with_capacity(levels.len());
        for level in levels {
            let rank = config
                .levels
                .iter()
                .position(|l| *l == level)
                .ok_or_else(|| RequestError::UnknownLevel(level.clone()))?;
            if !ordered_levels.iter().any(|(_, l)| *l == level) {
                ordered_levels.push((rank, level));
            }
        }
        ordered_levels.sort_by_key(|(rank, _)| *rank);

        Ok(Self {
            files: ordered_files
                .into_iter()
                .map(|(_, label, path)| (label, path))
                .collect(),
            levels: ordered_levels.into_iter().map(|(_, l)| l).collect(),
            output_dir,
        })
    }

    pub fn files(&self) -> &[(u32, PathBuf)] {
        &self.files
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Parse `300=path/to/results.txt`.
pub fn parse_category_pair(s: &str) -> Result<(u32, PathBuf), RequestError> {
    let (label, path) = s
        .split_once('=')
        .ok_or_else(|| RequestError::BadPair(s.to_string()))?;
    let label = label
        .trim()
        .parse::<u32>()
        .map_err(|_| RequestError::BadPair(s.to_string()))?;
    if path.is_empty() {
        return Err(RequestError::BadPair(s.to_string()));
    }
    Ok((label, PathBuf::from(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_extract_request_validation() {
        let dir = ExtractTarget::Directory(p("out"));
        assert_eq!(
            ExtractRequest::new(0, vec![p("a")], dir.clone(), false).unwrap_err(),
            RequestError::InvalidColumn
        );
        assert_eq!(
            ExtractRequest::new(2, vec![], dir.clone(), false).unwrap_err(),
            RequestError::NoInputs
        );
        assert_eq!(
            ExtractRequest::new(2, vec![p("a"), p("b")], ExtractTarget::File(p("o")), false)
                .unwrap_err(),
            RequestError::SingleOutputNeedsOneInput(2)
        );
        let req = ExtractRequest::new(2, vec![p("a"), p("b")], dir, true).unwrap();
        assert_eq!(req.column(), 2);
        assert!(req.overwrite());
    }

    #[test]
    fn test_barfiber_request_needs_folder() {
        assert_eq!(
            BarfiberRequest::new(vec![], p("out")).unwrap_err(),
            RequestError::NoFolders
        );
    }

    #[test]
    fn test_strain_request_orders_by_config() {
        let cfg = Config::default();
        let req = StrainRequest::new(
            vec![(500, p("e.txt")), (100, p("a.txt")), (300, p("c.txt"))],
            vec!["1.2g".into(), "0.3g".into(), "1.2g".into()],
            p("out"),
            &cfg,
        )
        .unwrap();

        let labels: Vec<u32> = req.files().iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec![100, 300, 500]);
        assert_eq!(req.files()[0].1, p("a.txt"));
        assert_eq!(req.levels(), &["0.3g".to_string(), "1.2g".to_string()]);
    }

    #[test]
    fn test_strain_request_rejects_bad_selection() {
        let cfg = Config::default();
        let levels = vec!["0.1g".to_string()];

        assert_eq!(
            StrainRequest::new(vec![], levels.clone(), p("o"), &cfg).unwrap_err(),
            RequestError::NoCategories
        );
        assert_eq!(
            StrainRequest::new(vec![(100, p("a"))], vec![], p("o"), &cfg).unwrap_err(),
            RequestError::NoLevels
        );
        assert_eq!(
            StrainRequest::new(vec![(150, p("a"))], levels.clone(), p("o"), &cfg).unwrap_err(),
            RequestError::UnknownCategory(150)
        );
        assert_eq!(
            StrainRequest::new(vec![(100, p("a")), (100, p("b"))], levels, p("o"), &cfg)
                .unwrap_err(),
            RequestError::DuplicateCategory(100)
        );
        assert_eq!(
            StrainRequest::new(vec![(100, p("a"))], vec!["2.0g".into()], p("o"), &cfg)
                .unwrap_err(),
            RequestError::UnknownLevel("2.0g".into())
        );
    }

    #[test]
    fn test_parse_category_pair() {
        assert_eq!(
            parse_category_pair("300=runs/h300.txt").unwrap(),
            (300, p("runs/h300.txt"))
        );
        assert!(parse_category_pair("300").is_err());
        assert!(parse_category_pair("abc=x").is_err());
        assert!(parse_category_pair("300=").is_err());
    }
}
