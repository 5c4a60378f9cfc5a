//! Derived bucket columns.
//!
//! Rules that cannot be applied (missing source, clashing target, source that
//! is not numeric) are skipped with a warning. The stage never fails on data.

use crate::config::{Breakpoints, BucketRule, DeriveConfig};
use crate::error::Result;
use crate::report::{Stage, StageReport};
use polars::prelude::*;

/// Label for `value` given left-closed intervals over `edges`.
///
/// `labels` must hold one more entry than `edges`.
pub fn bucket_label<'a>(value: f64, edges: &[f64], labels: &'a [String]) -> Option<&'a str> {
    if value.is_nan() {
        return None;
    }
    let idx = edges.partition_point(|edge| *edge <= value);
    labels.get(idx).map(String::as_str)
}

/// Label for `value` given right-closed intervals `(edges[i], edges[i + 1]]`,
/// the last one unbounded above.
///
/// Values at or below the first edge get no label. `labels` must hold as many
/// entries as `edges`.
pub fn right_closed_label<'a>(value: f64, edges: &[f64], labels: &'a [String]) -> Option<&'a str> {
    if value.is_nan() {
        return None;
    }
    let idx = edges.partition_point(|edge| *edge < value);
    idx.checked_sub(1)
        .and_then(|i| labels.get(i))
        .map(String::as_str)
}

/// 25th, 50th and 75th percentiles with linear interpolation.
pub fn quartile_edges(values: &Float64Chunked) -> Result<Option<Vec<f64>>> {
    let mut edges = Vec::with_capacity(3);
    for q in [0.25, 0.5, 0.75] {
        match values.quantile(q, QuantileMethod::Linear)? {
            Some(edge) => edges.push(edge),
            None => return Ok(None),
        }
    }
    Ok(Some(edges))
}

pub fn derive_features(df: DataFrame, config: &DeriveConfig) -> Result<(DataFrame, StageReport)> {
    let mut report = StageReport::new(Stage::Derive);
    let mut df = df;

    if df.height() == 0 {
        report.note("Empty table, no features derived");
        return Ok((df, report));
    }

    for rule in &config.rules {
        if let Some(series) = bucket_column(&df, rule, &mut report)? {
            df.with_column(series)?;
            report.columns_added.push(rule.target.clone());
            report.note(format!("Created {} from {}", rule.target, rule.source));
        }
    }

    tracing::info!("Derived {} columns", report.columns_added.len());
    Ok((df, report))
}

fn bucket_column(df: &DataFrame, rule: &BucketRule, report: &mut StageReport) -> Result<Option<Series>> {
    if df.column(&rule.target).is_ok() {
        report.warn(format!(
            "{}: column already exists, rule skipped",
            rule.target
        ));
        return Ok(None);
    }
    let Ok(source) = df.column(&rule.source) else {
        report.warn(format!(
            "{}: source column {} not found, rule skipped",
            rule.target, rule.source
        ));
        return Ok(None);
    };

    let source = source.as_materialized_series();
    if !source.dtype().is_primitive_numeric() && !matches!(source.dtype(), DataType::String) {
        report.warn(format!(
            "{}: source column {} has type {}, rule skipped",
            rule.target,
            rule.source,
            source.dtype()
        ));
        return Ok(None);
    }

    let numeric = source.cast(&DataType::Float64)?;
    if numeric.null_count() > source.null_count() {
        report.warn(format!(
            "{}: source column {} has non-numeric values, rule skipped",
            rule.target, rule.source
        ));
        return Ok(None);
    }
    let values = numeric.f64()?;

    let bucketed: Vec<Option<&str>> = match &rule.breakpoints {
        Breakpoints::Fixed { edges, labels } => values
            .into_iter()
            .map(|v| v.and_then(|x| bucket_label(x, edges, labels)))
            .collect(),
        Breakpoints::Quartiles { labels } => {
            let Some(quartiles) = quartile_edges(values)? else {
                report.warn(format!(
                    "{}: source column {} has no values to take quartiles from, rule skipped",
                    rule.target, rule.source
                ));
                return Ok(None);
            };
            let listed = quartiles
                .iter()
                .map(|e| format!("{e:.2}"))
                .collect::<Vec<_>>()
                .join(", ");

            // Buckets run from zero: (0, q25], (q25, q50], (q50, q75], (q75, inf)
            let mut edges = Vec::with_capacity(4);
            edges.push(0.0);
            edges.extend(quartiles);
            if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
                report.warn(format!(
                    "{}: quartile edges {listed} are not strictly increasing above zero, rule skipped",
                    rule.target
                ));
                return Ok(None);
            }

            report.note(format!("{} quartile edges: {listed}", rule.target));
            values
                .into_iter()
                .map(|v| v.and_then(|x| right_closed_label(x, &edges, labels)))
                .collect()
        }
    };

    Ok(Some(Series::new(rule.target.as_str().into(), bucketed)))
}
