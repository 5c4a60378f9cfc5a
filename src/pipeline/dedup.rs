//! Duplicate row removal.
//!
//! Two rows are duplicates when every non-identifier column holds the same
//! value, missing values included. The first occurrence is kept and row order
//! is preserved.

use crate::config::DedupConfig;
use crate::error::{Result, ResultExt as _};
use crate::report::{Stage, StageReport};
use polars::prelude::*;

/// Columns compared when looking for duplicates.
///
/// Identifier columns are left out; if nothing else remains the whole row is
/// compared.
pub fn comparison_columns(df: &DataFrame, config: &DedupConfig) -> Vec<String> {
    let all: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let subset: Vec<String> = all
        .iter()
        .filter(|name| !config.identifier_columns.contains(name))
        .cloned()
        .collect();

    if subset.is_empty() { all } else { subset }
}

/// Number of rows that repeat an earlier row.
pub fn count_duplicates(df: &DataFrame, config: &DedupConfig) -> Result<usize> {
    if df.height() == 0 {
        return Ok(0);
    }
    let unique = unique_rows(df, config)?;
    Ok(df.height() - unique.height())
}

/// Drop repeated rows, keeping the first of each.
pub fn deduplicate(df: DataFrame, config: &DedupConfig) -> Result<(DataFrame, StageReport)> {
    let mut report = StageReport::new(Stage::Deduplicate);

    if df.height() == 0 {
        report.note("Empty table, nothing to deduplicate");
        return Ok((df, report));
    }

    let before = df.height();
    let deduped = unique_rows(&df, config)?;
    report.rows_removed = before - deduped.height();
    report.note(format!("Removed {} duplicate rows", report.rows_removed));

    let ignored: Vec<&String> = config
        .identifier_columns
        .iter()
        .filter(|id| df.column(id.as_str()).is_ok())
        .collect();
    if !ignored.is_empty() {
        report.note(format!(
            "Compared rows ignoring identifier column(s): {}",
            ignored
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    tracing::info!("Removed {} duplicate rows", report.rows_removed);
    Ok((deduped, report))
}

fn unique_rows(df: &DataFrame, config: &DedupConfig) -> Result<DataFrame> {
    let subset = comparison_columns(df, config);
    df.unique_stable(Some(subset.as_slice()), UniqueKeepStrategy::First, None)
        .context("Failed to remove duplicate rows")
}
