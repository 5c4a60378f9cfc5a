//! Error handling for the hrclean pipeline.
//!
//! Library functions return [`Result<T>`], an alias over [`CleanError`]. The
//! variants follow the three failure classes the pipeline knows about:
//! unreadable input, bad configuration and dataframe failures. Column-level
//! problems (a column with an unexpected type, say) are not errors at all;
//! stages record them as warnings in their report and carry on.
//!
//! ```
//! use hrclean::error::CleanError;
//!
//! fn describe(err: &CleanError) -> &'static str {
//!     match err {
//!         CleanError::InvalidPath(_) | CleanError::Io(_) => "check the input file",
//!         CleanError::Config(_) => "check hrclean.json",
//!         _ => "processing failed",
//!     }
//! }
//! ```
//!
//! The [`ResultExt`] trait adds a `context` method to any result whose error
//! converts into [`CleanError`]:
//!
//! ```no_run
//! use hrclean::error::ResultExt as _;
//!
//! fn read_raw() -> hrclean::error::Result<String> {
//!     std::fs::read_to_string("data/raw/hr_data_raw.csv").context("Failed to read raw data")
//! }
//! ```

use std::fmt;

/// Main error type for hrclean operations.
#[derive(Debug)]
pub enum CleanError {
    /// I/O errors (reading input, writing outputs)
    Io(std::io::Error),

    /// Polars failures while loading or transforming the table
    DataProcessing(String),

    /// Invalid or unreadable configuration
    Config(String),

    /// Input file missing or path unusable
    InvalidPath(String),

    /// Spreadsheet export failures
    Export(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Export(msg) => write!(f, "Export error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CleanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CleanError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CleanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for CleanError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for CleanError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias for hrclean operations.
pub type Result<T> = std::result::Result<T, CleanError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CleanError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(e.into(), msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// Keeps the variant so callers can still match on the failure class.
fn wrap(err: CleanError, msg: String) -> CleanError {
    match err {
        CleanError::Io(e) => CleanError::Io(std::io::Error::new(e.kind(), format!("{msg}: {e}"))),
        CleanError::DataProcessing(inner) => CleanError::DataProcessing(format!("{msg}: {inner}")),
        CleanError::Config(inner) => CleanError::Config(format!("{msg}: {inner}")),
        CleanError::InvalidPath(inner) => CleanError::InvalidPath(format!("{msg}: {inner}")),
        CleanError::Export(inner) => CleanError::Export(format!("{msg}: {inner}")),
        CleanError::Other(inner) => CleanError::Other(format!("{msg}: {inner}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CleanError::DataProcessing("column not found".to_owned());
        assert_eq!(err.to_string(), "Data processing error: column not found");
    }

    #[test]
    fn test_result_context_keeps_variant() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.csv",
        ));

        let err = result.context("Failed to read input").unwrap_err();
        assert!(matches!(err, CleanError::Io(_)));
        assert!(err.to_string().contains("Failed to read input"));
        assert!(err.to_string().contains("file.csv"));
    }

    #[test]
    fn test_with_context_is_lazy_on_success() {
        let result: std::result::Result<u8, CleanError> = Ok(1);
        let value = result
            .with_context(|| panic!("context closure must not run on success"))
            .unwrap();
        assert_eq!(value, 1);
    }
}
