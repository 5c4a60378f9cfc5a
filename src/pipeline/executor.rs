//! Pipeline execution.
//!
//! Runs the stages against a loaded table in order and collects their reports.

use super::{assess, deduplicate, derive_features, impute, load_table, standardize};
use crate::config::CleanerConfig;
use crate::error::{Result, ResultExt as _};
use crate::export::export_table;
use crate::report::{ProcessingReport, ReportBuilder, Stage, StageReport, write_reports};
use polars::prelude::*;
use std::path::PathBuf;

/// Result of a full run.
#[derive(Debug)]
pub struct RunOutcome {
    /// The cleaned table as written
    pub table: DataFrame,
    pub report: ProcessingReport,
    /// Every file written, data first, reports last
    pub written: Vec<PathBuf>,
}

impl RunOutcome {
    /// One-line summary for the console.
    pub fn summary(&self) -> String {
        let report = &self.report;
        format!(
            "Pipeline completed: {} → {} rows, {} → {} columns, {} values filled, {} standardized, {:.2}s",
            report.original_shape.0,
            report.final_shape.0,
            report.original_shape.1,
            report.final_shape.1,
            report.values_filled(),
            report.values_standardized(),
            report.duration.as_secs_f64()
        )
    }
}

/// Run assessment and every cleaning stage on an in-memory table.
///
/// Stage reports are pushed onto `report` as each stage finishes.
pub fn clean_table(
    df: DataFrame,
    config: &CleanerConfig,
    report: &mut ReportBuilder,
) -> Result<DataFrame> {
    let (assessment, stage) = assess(&df, &config.dedup)?;
    report.set_assessment(assessment);
    report.push(stage);

    let (df, stage) = deduplicate(df, &config.dedup)?;
    report.push(stage);

    let (df, stage) = impute(df, &config.impute, &config.dedup.identifier_columns)?;
    report.push(stage);

    let (df, stage) = standardize(df, &config.standardize)?;
    report.push(stage);

    let (df, stage) = derive_features(df, &config.derive)?;
    report.push(stage);

    Ok(df)
}

/// Load, clean and export the configured input, then write the reports.
pub fn run_pipeline(config: &CleanerConfig) -> Result<RunOutcome> {
    tracing::info!("Starting pipeline for {}", config.input.path.display());
    let mut builder = ReportBuilder::new(&config.input.path, &config.output.path);

    let df = load_table(&config.input.path, &config.input)
        .with_context(|| format!("Failed to load {}", config.input.path.display()))?;
    builder.set_original_shape(df.shape());

    let mut loaded = StageReport::new(Stage::Load);
    loaded.note(format!(
        "Loaded data: {} rows, {} columns",
        df.height(),
        df.width()
    ));
    if df.height() == 0 {
        loaded.warn("Input has no data rows");
    }
    builder.push(loaded);

    let mut df = clean_table(df, config, &mut builder)?;

    let mut written = export_table(&mut df, &config.output)?;
    let mut exported = StageReport::new(Stage::Export);
    for path in &written {
        exported.note(format!("Cleaned data saved to {}", path.display()));
    }
    builder.push(exported);

    let report = builder.finish(&df, &config.report)?;
    write_reports(&report, &config.report)?;
    written.push(config.report.path.clone());
    written.push(config.report.summary_path.clone());

    tracing::info!(
        "Pipeline finished in {:.2}s: {} rows retained of {}",
        report.duration.as_secs_f64(),
        report.final_shape.0,
        report.original_shape.0
    );

    Ok(RunOutcome {
        table: df,
        report,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messy() -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Column::new("EmployeeID".into(), [1i64, 2, 3, 4]),
            Column::new("Age".into(), [Some(25i64), Some(25), Some(40), None]),
            Column::new(
                "Department".into(),
                [Some("sales"), Some("sales"), Some("R&D"), Some("HR")],
            ),
            Column::new(
                "JobRole".into(),
                [Some("Analyst"), Some("Analyst"), Some("Manager"), Some("Manager")],
            ),
            Column::new(
                "MonthlyIncome".into(),
                [Some(4000.0), Some(4000.0), Some(-9000.0), None],
            ),
        ])?)
    }

    #[test]
    fn test_clean_table_runs_every_stage() -> Result<()> {
        let mut builder = ReportBuilder::new("in.csv", "out.csv");
        let df = clean_table(messy()?, &CleanerConfig::default(), &mut builder)?;
        let report = builder.finish(&df, &CleanerConfig::default().report)?;

        // Row 2 duplicates row 1 apart from its EmployeeID
        assert_eq!(df.height(), 3);
        assert_eq!(report.rows_removed(), 1);

        // Income of the Manager group is missing for one row and negative for
        // another: the gap is filled first from the raw median, then signs fixed
        let income: Vec<Option<f64>> = df
            .column("MonthlyIncome")?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .collect();
        assert_eq!(income, vec![Some(4000.0), Some(9000.0), Some(9000.0)]);

        assert!(df.column("AgeGroup").is_ok());
        assert!(df.column("IncomeBracket").is_ok());
        assert_eq!(
            report.stages.iter().map(|s| s.stage).collect::<Vec<_>>(),
            vec![
                Stage::Assess,
                Stage::Deduplicate,
                Stage::Impute,
                Stage::Standardize,
                Stage::Derive
            ]
        );
        Ok(())
    }

    #[test]
    fn test_run_outcome_summary() -> Result<()> {
        let mut builder = ReportBuilder::new("in.csv", "out.csv");
        builder.set_original_shape((4, 5));
        let df = clean_table(messy()?, &CleanerConfig::default(), &mut builder)?;
        let report = builder.finish(&df, &CleanerConfig::default().report)?;

        let outcome = RunOutcome {
            table: df,
            report,
            written: Vec::new(),
        };
        assert!(outcome.summary().starts_with("Pipeline completed: 4 → 3 rows, 5 → 7 columns"));
        Ok(())
    }
}
