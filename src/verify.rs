//! Post-run check of a cleaned file.
//!
//! Reloads the output the way the pipeline loads its input and confirms it is
//! free of duplicate rows and missing values.

use crate::config::CleanerConfig;
use crate::error::Result;
use crate::pipeline::assess::{MissingColumn, assess};
use crate::pipeline::load_table;
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Rows kept in [`VerificationReport::sample`].
pub const SAMPLE_ROWS: usize = 3;

#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub duplicate_rows: usize,
    /// Columns that still have gaps
    pub missing: Vec<MissingColumn>,
    pub sample: DataFrame,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.duplicate_rows == 0 && self.missing.is_empty()
    }

    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|m| m.missing).sum()
    }
}

/// Load `path` and check it for duplicates and gaps.
///
/// Duplicates are compared the same way the pipeline compares them, ignoring
/// the configured identifier columns.
pub fn verify(path: &Path, config: &CleanerConfig) -> Result<VerificationReport> {
    let df = load_table(path, &config.input)?;
    let (assessment, _) = assess(&df, &config.dedup)?;

    let report = VerificationReport {
        path: path.to_path_buf(),
        rows: assessment.rows,
        columns: assessment.columns,
        duplicate_rows: assessment.duplicate_rows,
        missing: assessment.missing,
        sample: df.head(Some(SAMPLE_ROWS)),
    };

    if report.passed() {
        tracing::info!("{} passed verification", path.display());
    } else {
        tracing::warn!(
            "{} failed verification: {} duplicates, {} missing values",
            path.display(),
            report.duplicate_rows,
            report.total_missing()
        );
    }
    Ok(report)
}
