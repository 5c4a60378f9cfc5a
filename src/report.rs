//! Processing report.
//!
//! Each stage returns a [`StageReport`] with its counters. The executor hands
//! them to a [`ReportBuilder`] as they arrive; [`ReportBuilder::finish`] stamps
//! the run timing and final shape and produces the read-only
//! [`ProcessingReport`], which [`renderer`] turns into text and CSV.

pub mod renderer;

pub use renderer::{counter_table, render_text, write_reports};

use crate::config::ReportConfig;
use crate::error::Result;
use crate::pipeline::assess::QualityAssessment;
use chrono::{DateTime, Local};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Assess,
    Deduplicate,
    Impute,
    Standardize,
    Derive,
    Export,
}

impl Stage {
    /// Stable machine-readable name, used in the CSV summary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Assess => "assess",
            Self::Deduplicate => "deduplicate",
            Self::Impute => "impute",
            Self::Standardize => "standardize",
            Self::Derive => "derive",
            Self::Export => "export",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Load => "Load data",
            Self::Assess => "Assess data quality",
            Self::Deduplicate => "Remove duplicates",
            Self::Impute => "Handle missing values",
            Self::Standardize => "Standardize values",
            Self::Derive => "Create derived features",
            Self::Export => "Save cleaned data",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters and messages from one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub rows_removed: usize,
    pub values_filled: BTreeMap<String, usize>,
    pub values_standardized: BTreeMap<String, usize>,
    pub columns_added: Vec<String>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            rows_removed: 0,
            values_filled: BTreeMap::new(),
            values_standardized: BTreeMap::new(),
            columns_added: Vec::new(),
            warnings: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(message.into());
    }

    /// Record a warning and log it.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(stage = self.stage.as_str(), "{message}");
        self.warnings.push(message);
    }

    pub fn total_filled(&self) -> usize {
        self.values_filled.values().sum()
    }

    pub fn total_standardized(&self) -> usize {
        self.values_standardized.values().sum()
    }
}

/// Share of rows per value of a category column, most common first.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub column: String,
    pub counts: Vec<(String, usize)>,
    pub total: usize,
}

/// Summary statistics of a numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Sample standard deviation
    pub std: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Insights {
    pub distribution: Option<Distribution>,
    pub statistics: Option<NumericSummary>,
}

impl Insights {
    /// Columns that are absent, or of the wrong type, are left out.
    pub fn compute(df: &DataFrame, config: &ReportConfig) -> Result<Self> {
        let distribution = match config.distribution_column.as_deref() {
            Some(name) => distribution(df, name)?,
            None => None,
        };
        let statistics = match config.statistics_column.as_deref() {
            Some(name) => numeric_summary(df, name)?,
            None => None,
        };
        Ok(Self {
            distribution,
            statistics,
        })
    }
}

fn distribution(df: &DataFrame, name: &str) -> Result<Option<Distribution>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let text = column
        .as_materialized_series()
        .cast(&DataType::String)?
        .drop_nulls();

    // Most frequent first, ties in value order
    let value_counts = text
        .value_counts(false, false, "counts".into(), false)?
        .sort(
            ["counts", name],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )?;
    let values = value_counts.column(name)?.as_materialized_series();
    let tallies = value_counts
        .column("counts")?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;

    let counts: Vec<(String, usize)> = values
        .str()?
        .into_iter()
        .zip(tallies.u64()?)
        .filter_map(|(value, count)| Some((value?.to_owned(), count? as usize)))
        .collect();

    Ok(Some(Distribution {
        column: name.to_owned(),
        total: df.height(),
        counts,
    }))
}

/// Numeric column statistics; `None` if absent or not numeric.
pub fn numeric_summary(df: &DataFrame, name: &str) -> Result<Option<NumericSummary>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    if !column.dtype().is_primitive_numeric() {
        return Ok(None);
    }
    let numeric = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = numeric.f64()?;

    Ok(Some(NumericSummary {
        column: name.to_owned(),
        mean: values.mean(),
        median: values.median(),
        min: values.min(),
        max: values.max(),
        std: values.std(1),
    }))
}

/// Immutable summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// (rows, columns) as loaded
    pub original_shape: (usize, usize),
    /// (rows, columns) as written
    pub final_shape: (usize, usize),
    pub assessment: Option<QualityAssessment>,
    pub stages: Vec<StageReport>,
    pub insights: Insights,
}

impl ProcessingReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn rows_removed(&self) -> usize {
        self.stages.iter().map(|s| s.rows_removed).sum()
    }

    pub fn values_filled(&self) -> usize {
        self.stages.iter().map(StageReport::total_filled).sum()
    }

    pub fn values_standardized(&self) -> usize {
        self.stages.iter().map(StageReport::total_standardized).sum()
    }

    pub fn warnings(&self) -> impl Iterator<Item = (Stage, &str)> {
        self.stages
            .iter()
            .flat_map(|s| s.warnings.iter().map(move |w| (s.stage, w.as_str())))
    }

    /// Percentage of loaded rows that survived cleaning.
    pub fn retention_percent(&self) -> f64 {
        if self.original_shape.0 == 0 {
            100.0
        } else {
            self.final_shape.0 as f64 / self.original_shape.0 as f64 * 100.0
        }
    }

    /// Loaded rows per second of run time; `None` when no time was measured.
    pub fn records_per_second(&self) -> Option<f64> {
        let secs = self.duration.as_secs_f64();
        (secs > 0.0).then(|| self.original_shape.0 as f64 / secs)
    }
}

/// Collects stage reports during a run.
#[derive(Debug)]
pub struct ReportBuilder {
    started_at: DateTime<Local>,
    clock: Instant,
    input_path: PathBuf,
    output_path: PathBuf,
    original_shape: (usize, usize),
    assessment: Option<QualityAssessment>,
    stages: Vec<StageReport>,
}

impl ReportBuilder {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            started_at: Local::now(),
            clock: Instant::now(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            original_shape: (0, 0),
            assessment: None,
            stages: Vec::new(),
        }
    }

    pub fn set_original_shape(&mut self, shape: (usize, usize)) {
        self.original_shape = shape;
    }

    pub fn set_assessment(&mut self, assessment: QualityAssessment) {
        self.assessment = Some(assessment);
    }

    pub fn push(&mut self, report: StageReport) {
        tracing::debug!(
            stage = report.stage.as_str(),
            warnings = report.warnings.len(),
            "Stage complete"
        );
        self.stages.push(report);
    }

    pub fn finish(self, final_table: &DataFrame, config: &ReportConfig) -> Result<ProcessingReport> {
        Ok(ProcessingReport {
            started_at: self.started_at,
            duration: self.clock.elapsed(),
            input_path: self.input_path,
            output_path: self.output_path,
            original_shape: self.original_shape,
            final_shape: final_table.shape(),
            assessment: self.assessment,
            stages: self.stages,
            insights: Insights::compute(final_table, config)?,
        })
    }
}
