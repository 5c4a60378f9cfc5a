//! Quality assessment of the raw table, taken before anything is changed.

use super::dedup::count_duplicates;
use crate::config::DedupConfig;
use crate::error::Result;
use crate::report::{Stage, StageReport};
use polars::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct QualityAssessment {
    pub rows: usize,
    pub columns: usize,
    pub duplicate_rows: usize,
    /// Only columns that have gaps, in schema order
    pub missing: Vec<MissingColumn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingColumn {
    pub column: String,
    pub missing: usize,
    pub percent: f64,
}

impl QualityAssessment {
    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|m| m.missing).sum()
    }
}

pub fn assess(df: &DataFrame, dedup: &DedupConfig) -> Result<(QualityAssessment, StageReport)> {
    let mut report = StageReport::new(Stage::Assess);
    let rows = df.height();

    let duplicate_rows = count_duplicates(df, dedup)?;
    report.note(format!("Found {duplicate_rows} duplicate rows"));

    let missing: Vec<MissingColumn> = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| MissingColumn {
            column: c.name().to_string(),
            missing: c.null_count(),
            percent: percent(c.null_count(), rows),
        })
        .collect();

    if missing.is_empty() {
        report.note("No missing values found");
    } else {
        report.note("Missing values found:");
        for m in &missing {
            report.note(format!(
                "  - {}: {} missing ({:.1}%)",
                m.column, m.missing, m.percent
            ));
        }
    }

    tracing::info!(
        "Found {} duplicates and missing values in {} columns",
        duplicate_rows,
        missing.len()
    );

    let assessment = QualityAssessment {
        rows,
        columns: df.width(),
        duplicate_rows,
        missing,
    };
    Ok((assessment, report))
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_duplicates_and_gaps() -> Result<()> {
        let df = DataFrame::new(vec![
            Column::from(Series::new("EmployeeID".into(), vec![1i64, 2, 3, 4])),
            Column::from(Series::new(
                "JobRole".into(),
                vec![Some("Analyst"), Some("Analyst"), None, Some("Manager")],
            )),
            Column::from(Series::new(
                "MonthlyIncome".into(),
                vec![Some(4000.0), Some(4000.0), Some(5200.0), None],
            )),
        ])?;

        let (assessment, report) = assess(&df, &DedupConfig::default())?;

        assert_eq!(assessment.rows, 4);
        assert_eq!(assessment.columns, 3);
        assert_eq!(assessment.duplicate_rows, 1);
        assert_eq!(assessment.total_missing(), 2);
        assert_eq!(assessment.missing.len(), 2);
        assert_eq!(assessment.missing[0].column, "JobRole");
        assert!((assessment.missing[0].percent - 25.0).abs() < 1e-9);
        assert!(report.notes[0].contains("1 duplicate"));
        // Assessment is read-only
        assert_eq!(df.height(), 4);
        Ok(())
    }
}
