//! Writing the cleaned table to disk.
//!
//! The CSV is the primary output. When enabled, a workbook with the same stem
//! is written beside it holding the data on a `CleanData` sheet and headline
//! figures on a `Summary` sheet.

use crate::config::OutputConfig;
use crate::error::{CleanError, Result, ResultExt as _};
use crate::report::numeric_summary;
use crate::report::renderer::format_amount;
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};

/// Worksheet row limit, header included.
const MAX_SHEET_ROWS: usize = 1_048_576;
const MAX_SHEET_COLUMNS: usize = 16_384;

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Write the cleaned outputs and return the paths written.
pub fn export_table(df: &mut DataFrame, config: &OutputConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(2);

    write_csv(df, &config.path)?;
    written.push(config.path.clone());

    if config.excel {
        let excel_path = config.excel_path();
        write_workbook(df, &excel_path)?;
        written.push(excel_path);
    }

    tracing::info!("Saved clean data ({} rows)", df.height());
    Ok(written)
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .context("Failed to write CSV file")?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

pub fn write_workbook(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() >= MAX_SHEET_ROWS || df.width() > MAX_SHEET_COLUMNS {
        return Err(CleanError::Export(format!(
            "{} rows × {} columns does not fit in a worksheet",
            df.height(),
            df.width()
        )));
    }
    ensure_parent_dir(path)?;

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let data = workbook.add_worksheet();
    data.set_name("CleanData")?;
    write_data_sheet(data, df, &header)?;

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    summary.write_string_with_format(0, 0, "Metric", &header)?;
    summary.write_string_with_format(0, 1, "Value", &header)?;
    for (row, (metric, value)) in (1u32..).zip(workbook_summary(df)?) {
        summary.write_string(row, 0, metric)?;
        summary.write_string(row, 1, value)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

fn write_data_sheet(sheet: &mut Worksheet, df: &DataFrame, header: &Format) -> Result<()> {
    for (col_idx, column) in (0u16..).zip(df.get_columns()) {
        sheet.write_string_with_format(0, col_idx, column.name().as_str(), header)?;

        let series = column.as_materialized_series();
        if series.dtype().is_primitive_numeric() {
            let values = series.cast(&DataType::Float64)?;
            for (row, value) in (1u32..).zip(values.f64()?) {
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    sheet.write_number(row, col_idx, v)?;
                }
            }
        } else if matches!(series.dtype(), DataType::Boolean) {
            for (row, value) in (1u32..).zip(series.bool()?) {
                if let Some(v) = value {
                    sheet.write_boolean(row, col_idx, v)?;
                }
            }
        } else {
            let values = series.cast(&DataType::String)?;
            for (row, value) in (1u32..).zip(values.str()?) {
                if let Some(v) = value {
                    sheet.write_string(row, col_idx, v)?;
                }
            }
        }
    }
    Ok(())
}

/// Headline figures for the `Summary` sheet. Absent columns read `N/A`.
pub fn workbook_summary(df: &DataFrame) -> Result<Vec<(&'static str, String)>> {
    let na = || "N/A".to_owned();

    let departments = distinct_count(df, "Department")?.map_or_else(na, |n| n.to_string());
    let job_roles = distinct_count(df, "JobRole")?.map_or_else(na, |n| n.to_string());
    let age = numeric_summary(df, "Age")?
        .and_then(|s| s.mean)
        .map_or_else(na, |m| format!("{m:.1}"));
    let income = numeric_summary(df, "MonthlyIncome")?
        .and_then(|s| s.mean)
        .map_or_else(na, |m| format_amount(m, 0));

    Ok(vec![
        ("Total Records", df.height().to_string()),
        ("Total Columns", df.width().to_string()),
        ("Departments", departments),
        ("Job Roles", job_roles),
        ("Average Age", age),
        ("Average Monthly Income", income),
    ])
}

fn distinct_count(df: &DataFrame, name: &str) -> Result<Option<usize>> {
    match df.column(name) {
        Ok(column) => Ok(Some(
            column.as_materialized_series().drop_nulls().n_unique()?,
        )),
        Err(_) => Ok(None),
    }
}
