//! Text and CSV rendering of a [`ProcessingReport`].

use super::{ProcessingReport, Stage};
use crate::config::ReportConfig;
use crate::error::{Result, ResultExt as _};
use crate::export::ensure_parent_dir;
use polars::prelude::*;
use std::path::Path;

/// Render the human-readable processing report.
pub fn render_text(report: &ProcessingReport) -> String {
    let mut out = String::new();

    out.push_str("HR DATA PROCESSING REPORT\n");
    out.push_str(&format!("{}\n\n", "=".repeat(50)));

    out.push_str(&format!(
        "Processing Date: {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!(
        "Processing Time: {:.2} seconds\n",
        report.duration.as_secs_f64()
    ));
    out.push_str(&format!("Input File: {}\n", report.input_path.display()));
    out.push_str(&format!("Output File: {}\n\n", report.output_path.display()));

    section(&mut out, "DATA TRANSFORMATION SUMMARY");
    let (rows_in, cols_in) = report.original_shape;
    let (rows_out, cols_out) = report.final_shape;
    out.push_str(&format!("Original Shape: {rows_in} rows × {cols_in} columns\n"));
    out.push_str(&format!("Final Shape: {rows_out} rows × {cols_out} columns\n"));
    out.push_str(&format!("Rows Processed: {rows_in}\n"));
    out.push_str(&format!("Rows Retained: {rows_out}\n"));
    out.push_str(&format!(
        "Data Quality Improvement: {:.1}% clean data retention\n\n",
        report.retention_percent()
    ));

    if let Some(assessment) = &report.assessment {
        section(&mut out, "DATA QUALITY ASSESSMENT");
        out.push_str(&format!("• Duplicate rows: {}\n", assessment.duplicate_rows));
        out.push_str(&format!(
            "• Missing values: {} across {} columns\n",
            assessment.total_missing(),
            assessment.missing.len()
        ));
        for m in &assessment.missing {
            out.push_str(&format!(
                "  - {}: {} missing ({:.1}%)\n",
                m.column, m.missing, m.percent
            ));
        }
        out.push('\n');
    }

    section(&mut out, "PROCESSING STEPS COMPLETED");
    let mut step = 0;
    for stage in &report.stages {
        for note in &stage.notes {
            // Continuation lines stay attached to the step above them
            if note.starts_with(' ') {
                out.push_str(&format!("   {}\n", note.trim_start()));
            } else {
                step += 1;
                out.push_str(&format!("{step}. {note}\n"));
            }
        }
        for warning in &stage.warnings {
            step += 1;
            out.push_str(&format!("{step}. Warning ({}): {warning}\n", stage.stage.title()));
        }
    }
    out.push('\n');

    if let Some(distribution) = &report.insights.distribution {
        section(&mut out, &format!("{} DISTRIBUTION", distribution.column.to_uppercase()));
        for (value, count) in &distribution.counts {
            let share = if distribution.total == 0 {
                0.0
            } else {
                *count as f64 / distribution.total as f64 * 100.0
            };
            out.push_str(&format!("• {value}: {count} employees ({share:.1}%)\n"));
        }
        out.push('\n');
    }

    if let Some(stats) = &report.insights.statistics {
        section(&mut out, &format!("{} STATISTICS", stats.column.to_uppercase()));
        out.push_str(&format!("• Average: {}\n", money(stats.mean)));
        out.push_str(&format!("• Median: {}\n", money(stats.median)));
        out.push_str(&format!(
            "• Range: {} - {}\n",
            money(stats.min),
            money(stats.max)
        ));
        out.push_str(&format!("• Standard Deviation: {}\n", money(stats.std)));
        out.push('\n');
    }

    section(&mut out, "EFFICIENCY METRICS");
    match report.records_per_second() {
        Some(speed) => out.push_str(&format!("• Processing Speed: {speed:.0} records/second\n")),
        None => out.push_str("• Processing Speed: N/A\n"),
    }
    out.push_str(&format!(
        "• Automated Time: {:.1} seconds\n",
        report.duration.as_secs_f64()
    ));

    out
}

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("{title}:\n"));
    out.push_str(&format!("{}\n", "-".repeat(title.chars().count() + 1)));
}

/// `$1,234.50` style amount, `N/A` when absent.
fn money(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(value) => format_amount(value, 2),
        None => "N/A".to_owned(),
    }
}

/// Dollar amount with thousands separators and `decimals` places.
pub(crate) fn format_amount(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.decimals$}", value.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{sign}${grouped}.{fraction}"),
        None => format!("{sign}${grouped}"),
    }
}

/// One row per counter: `stage,column,metric,value`.
pub fn counter_table(report: &ProcessingReport) -> Result<DataFrame> {
    let mut stages: Vec<&str> = Vec::new();
    let mut columns: Vec<Option<String>> = Vec::new();
    let mut metrics: Vec<&str> = Vec::new();
    let mut values: Vec<u64> = Vec::new();

    let mut push = |stage: Stage, column: &str, metric: &'static str, value: usize| {
        stages.push(stage.as_str());
        columns.push((!column.is_empty()).then(|| column.to_owned()));
        metrics.push(metric);
        values.push(value as u64);
    };

    push(Stage::Load, "", "rows", report.original_shape.0);
    push(Stage::Load, "", "columns", report.original_shape.1);

    if let Some(assessment) = &report.assessment {
        push(Stage::Assess, "", "duplicate_rows", assessment.duplicate_rows);
        for m in &assessment.missing {
            push(Stage::Assess, &m.column, "missing_values", m.missing);
        }
    }

    for stage in &report.stages {
        if stage.stage == Stage::Deduplicate {
            push(stage.stage, "", "rows_removed", stage.rows_removed);
        }
        for (column, count) in &stage.values_filled {
            push(stage.stage, column, "values_filled", *count);
        }
        for (column, count) in &stage.values_standardized {
            push(stage.stage, column, "values_standardized", *count);
        }
        for column in &stage.columns_added {
            push(stage.stage, column, "column_added", 1);
        }
        if !stage.warnings.is_empty() {
            push(stage.stage, "", "warnings", stage.warnings.len());
        }
    }

    push(Stage::Export, "", "rows", report.final_shape.0);
    push(Stage::Export, "", "columns", report.final_shape.1);

    Ok(DataFrame::new(vec![
        Column::new("stage".into(), stages),
        Column::new("column".into(), columns),
        Column::new("metric".into(), metrics),
        Column::new("value".into(), values),
    ])?)
}

/// Write the text report and the CSV counter summary.
pub fn write_reports(report: &ProcessingReport, config: &ReportConfig) -> Result<()> {
    write_text(report, &config.path)?;
    write_counters(report, &config.summary_path)?;
    tracing::info!(
        "Reports written to {} and {}",
        config.path.display(),
        config.summary_path.display()
    );
    Ok(())
}

fn write_text(report: &ProcessingReport, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, render_text(report))
        .with_context(|| format!("Failed to write report {}", path.display()))
}

fn write_counters(report: &ProcessingReport, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut table = counter_table(report)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create summary {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut table)
        .context("Failed to write summary CSV")
}
