//! Reads the raw delimited extract into a `DataFrame`.

use crate::config::InputConfig;
use crate::error::{CleanError, Result, ResultExt as _};
use polars::prelude::*;
use std::path::Path;

/// Load a delimited file with a header row.
///
/// Empty fields and the configured null markers become missing values. A
/// header-only file loads as an empty table.
///
/// # Errors
///
/// `InvalidPath` if the file does not exist, `Config` for a bad separator,
/// `DataProcessing` if Polars cannot parse the file.
pub fn load_table(path: &Path, input: &InputConfig) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(CleanError::InvalidPath(format!(
            "input file not found: {}",
            path.display()
        )));
    }

    // Surface permission problems as I/O errors instead of parser noise.
    std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let null_values = NullValues::AllColumns(
        input
            .null_values
            .iter()
            .map(|v| PlSmallStr::from_str(v))
            .collect(),
    );

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_separator(input.separator()?)
        .with_infer_schema_length(Some(input.infer_schema_length))
        .with_null_values(Some(null_values))
        .finish()
        .with_context(|| format!("Failed to scan {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to read {}", path.display()))?;

    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );

    Ok(df)
}
