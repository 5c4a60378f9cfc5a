//! Run configuration.
//!
//! Everything the pipeline needs to know about the dataset lives in a
//! [`CleanerConfig`], serialised as JSON. Every field has a default, so a
//! partial file only needs the keys it changes:
//!
//! ```json
//! {
//!   "input": { "path": "exports/workday.csv", "delimiter": ";" },
//!   "impute": { "group_by": "Department" }
//! }
//! ```
//!
//! The defaults describe the standard HR extract (`EmployeeID`, `JobRole`,
//! `Department`, `Gender`, `Age`, `MonthlyIncome`, `JobSatisfaction`).

use crate::error::{CleanError, Result, ResultExt as _};
use crate::pipeline::standardize::AliasTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "hrclean.json";

pub const DATA_INPUT_DIR: &str = "data/raw";
pub const DATA_PROCESSED_DIR: &str = "data/processed";
pub const REPORTS_DIR: &str = "reports";

/// Root configuration for one cleaning run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub dedup: DedupConfig,
    pub impute: ImputeConfig,
    pub standardize: StandardizeConfig,
    pub derive: DeriveConfig,
    pub report: ReportConfig,
}

impl CleanerConfig {
    /// Load a config from a JSON file. The file must exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse and validate a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Write the config to a JSON file, creating parent directories.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Resolve the config for a run.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
    /// working directory is used if present, otherwise the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CleanError::InvalidPath(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            tracing::info!("Using config from {}", local.display());
            return Self::from_file(local);
        }

        Ok(Self::default())
    }

    /// Check bucket rules and vocabularies before any data is touched.
    pub fn validate(&self) -> Result<()> {
        if self.input.delimiter.len() != 1 {
            return Err(CleanError::Config(format!(
                "delimiter must be a single byte, got {:?}",
                self.input.delimiter
            )));
        }

        for rule in &self.derive.rules {
            rule.validate()?;
        }

        for (column, vocabulary) in &self.standardize.vocabularies {
            AliasTable::from_vocabulary(column, vocabulary)?;
        }

        Ok(())
    }
}

/// Input file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Delimited file with a header row
    pub path: PathBuf,

    /// Field separator (single byte)
    pub delimiter: String,

    /// Extra strings read as missing, on top of empty fields
    pub null_values: Vec<String>,

    /// Rows scanned to infer column types
    pub infer_schema_length: usize,
}

impl InputConfig {
    pub fn separator(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(CleanError::Config(format!(
                "delimiter must be a single byte, got {:?}",
                self.delimiter
            ))),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DATA_INPUT_DIR).join("hr_data_raw.csv"),
            delimiter: ",".to_owned(),
            null_values: ["NA", "N/A", "null", "NULL", "NaN"]
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            infer_schema_length: 10_000,
        }
    }
}

/// Output file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Cleaned CSV path
    pub path: PathBuf,

    /// Also write a `.xlsx` copy next to the CSV
    pub excel: bool,
}

impl OutputConfig {
    /// The spreadsheet copy shares the CSV's stem.
    pub fn excel_path(&self) -> PathBuf {
        self.path.with_extension("xlsx")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DATA_PROCESSED_DIR).join("hr_data_clean.csv"),
            excel: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Columns ignored when comparing rows
    pub identifier_columns: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            identifier_columns: vec!["EmployeeID".to_owned()],
        }
    }
}

/// How missing values in a column are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Median within the `group_by` group, then the column median
    GroupMedian,
    /// Column median
    Median,
    /// Most frequent value; ties go to the value seen first
    Mode,
    /// Leave missing values alone
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputeConfig {
    /// Categorical column defining the median groups
    pub group_by: Option<String>,

    /// Per-column overrides. Numeric columns default to `group_median`,
    /// text columns to `mode`.
    pub strategies: BTreeMap<String, ImputeStrategy>,
}

impl Default for ImputeConfig {
    fn default() -> Self {
        Self {
            group_by: Some("JobRole".to_owned()),
            strategies: BTreeMap::from([("JobSatisfaction".to_owned(), ImputeStrategy::Mode)]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardizeConfig {
    /// column -> canonical value -> aliases
    pub vocabularies: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    /// Numeric columns whose negative values are sign errors
    pub non_negative: Vec<String>,
}

impl Default for StandardizeConfig {
    fn default() -> Self {
        let department = BTreeMap::from([
            ("Sales".to_owned(), Vec::new()),
            ("Research & Development".to_owned(), vec!["R&D".to_owned()]),
            ("Human Resources".to_owned(), vec!["HR".to_owned()]),
        ]);
        let gender = BTreeMap::from([
            ("Male".to_owned(), vec!["M".to_owned()]),
            ("Female".to_owned(), vec!["F".to_owned()]),
        ]);

        Self {
            vocabularies: BTreeMap::from([
                ("Department".to_owned(), department),
                ("Gender".to_owned(), gender),
            ]),
            non_negative: vec!["MonthlyIncome".to_owned()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveConfig {
    pub rules: Vec<BucketRule>,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                BucketRule {
                    source: "Age".to_owned(),
                    target: "AgeGroup".to_owned(),
                    breakpoints: Breakpoints::Fixed {
                        edges: vec![25.0, 35.0, 45.0, 55.0],
                        labels: labels(&["Under 25", "25-34", "35-44", "45-54", "55+"]),
                    },
                },
                BucketRule {
                    source: "MonthlyIncome".to_owned(),
                    target: "IncomeBracket".to_owned(),
                    breakpoints: Breakpoints::Fixed {
                        edges: vec![3000.0, 6000.0, 10_000.0],
                        labels: labels(&["Low", "Medium", "High", "Very High"]),
                    },
                },
            ],
        }
    }
}

/// Derives `target` by bucketing the numeric `source` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketRule {
    pub source: String,
    pub target: String,
    pub breakpoints: Breakpoints,
}

impl BucketRule {
    pub fn validate(&self) -> Result<()> {
        if self.source.is_empty() || self.target.is_empty() {
            return Err(CleanError::Config(
                "bucket rule needs both a source and a target column".to_owned(),
            ));
        }

        match &self.breakpoints {
            Breakpoints::Fixed { edges, labels } => {
                if labels.len() != edges.len() + 1 {
                    return Err(CleanError::Config(format!(
                        "{}: {} edges need {} labels, got {}",
                        self.target,
                        edges.len(),
                        edges.len() + 1,
                        labels.len()
                    )));
                }
                if edges.iter().any(|e| !e.is_finite()) {
                    return Err(CleanError::Config(format!(
                        "{}: bucket edges must be finite",
                        self.target
                    )));
                }
                if edges.windows(2).any(|w| matches!(w, [a, b] if a >= b)) {
                    return Err(CleanError::Config(format!(
                        "{}: bucket edges must be strictly increasing",
                        self.target
                    )));
                }
            }
            Breakpoints::Quartiles { labels } => {
                if labels.len() != 4 {
                    return Err(CleanError::Config(format!(
                        "{}: quartile buckets need 4 labels, got {}",
                        self.target,
                        labels.len()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Bucket boundaries. Intervals are closed on the left.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Breakpoints {
    /// `labels[0]` below `edges[0]`, `labels[i]` in `[edges[i-1], edges[i])`,
    /// the last label from the last edge upwards.
    Fixed { edges: Vec<f64>, labels: Vec<String> },

    /// Edges taken from the source column's quartiles.
    Quartiles { labels: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Human-readable report
    pub path: PathBuf,

    /// CSV counter summary
    pub summary_path: PathBuf,

    /// Category column whose distribution is listed
    pub distribution_column: Option<String>,

    /// Numeric column summarised with mean/median/range/std
    pub statistics_column: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(REPORTS_DIR).join("hr_data_processing_report.txt"),
            summary_path: PathBuf::from(REPORTS_DIR).join("hr_data_processing_summary.csv"),
            distribution_column: Some("Department".to_owned()),
            statistics_column: Some("MonthlyIncome".to_owned()),
        }
    }
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_owned()).collect()
}
