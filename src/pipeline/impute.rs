//! Missing value imputation.
//!
//! Numeric columns are filled with the median of their group (rows sharing
//! the `group_by` value), falling back to the column median when the group has
//! nothing to offer. Text columns are filled with the column mode. Both
//! defaults can be overridden per column.

use crate::config::{ImputeConfig, ImputeStrategy};
use crate::error::{Result, ResultExt as _};
use crate::report::{Stage, StageReport};
use polars::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;

/// Most frequent value of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeValue {
    Int(i64),
    UInt(u64),
    Number(f64),
    Text(String),
}

impl std::fmt::Display for ModeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnClass {
    Numeric,
    Text,
    Other,
}

fn classify(dtype: &DataType) -> ColumnClass {
    if dtype.is_primitive_numeric() {
        ColumnClass::Numeric
    } else if matches!(dtype, DataType::String) {
        ColumnClass::Text
    } else {
        ColumnClass::Other
    }
}

/// Fill missing values column by column.
///
/// `identifiers` are never imputed. The group column is handled last so
/// every grouped median is computed over the groups as loaded.
pub fn impute(
    df: DataFrame,
    config: &ImputeConfig,
    identifiers: &[String],
) -> Result<(DataFrame, StageReport)> {
    let mut report = StageReport::new(Stage::Impute);
    let mut df = df;

    if df.height() == 0 {
        report.note("Empty table, nothing to impute");
        return Ok((df, report));
    }

    let group = match config.group_by.as_deref() {
        Some(g) if df.column(g).is_ok() => Some(g.to_owned()),
        Some(g) => {
            report.warn(format!(
                "Group column {g} not found; numeric columns use the column median"
            ));
            None
        }
        None => None,
    };

    let mut targets: Vec<(String, DataType)> = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| (c.name().to_string(), c.dtype().clone()))
        .collect();
    // Stable sort keeps schema order for everything but the group column
    targets.sort_by_key(|(name, _)| group.as_deref() == Some(name.as_str()));

    for (name, dtype) in targets {
        if identifiers.contains(&name) {
            report.warn(format!("{name}: identifier column has missing values, left as is"));
            continue;
        }

        let class = classify(&dtype);
        let strategy = config
            .strategies
            .get(&name)
            .copied()
            .unwrap_or(match class {
                ColumnClass::Numeric => ImputeStrategy::GroupMedian,
                ColumnClass::Text | ColumnClass::Other => ImputeStrategy::Mode,
            });

        if strategy == ImputeStrategy::Skip {
            report.note(format!("{name}: imputation disabled"));
            continue;
        }
        if class == ColumnClass::Other {
            report.warn(format!(
                "{name}: unsupported type {dtype} for imputation, column skipped"
            ));
            continue;
        }

        let before = df.column(&name)?.null_count();
        let method = match strategy {
            ImputeStrategy::GroupMedian | ImputeStrategy::Median => {
                if class == ColumnClass::Text {
                    match coerce_to_numeric(&df, &name)? {
                        Some(numeric) => {
                            df.with_column(numeric)?;
                        }
                        None => {
                            report.warn(format!(
                                "{name}: text values could not be read as numbers, column skipped"
                            ));
                            continue;
                        }
                    }
                }

                let by = match (strategy, group.as_deref()) {
                    (ImputeStrategy::GroupMedian, Some(g)) if g != name => Some(g),
                    _ => None,
                };
                df = fill_median(df, &name, by)?;
                match by {
                    Some(g) => format!("{g} median"),
                    None => "column median".to_owned(),
                }
            }
            ImputeStrategy::Mode => {
                let series = df.column(&name)?.as_materialized_series().clone();
                match column_mode(&series)? {
                    Some(mode) => {
                        df = fill_mode(df, &name, &dtype, &mode)?;
                        format!("mode ({mode})")
                    }
                    None => String::new(),
                }
            }
            ImputeStrategy::Skip => continue,
        };

        let after = df.column(&name)?.null_count();
        let filled = before - after;
        if filled > 0 {
            report.values_filled.insert(name.clone(), filled);
            report.note(format!("Filled {filled} missing {name} values using {method}"));
        }
        if after > 0 {
            report.warn(format!(
                "{name}: no values to impute from, {after} values still missing"
            ));
        }
    }

    tracing::info!(
        "Filled {} missing values across {} columns",
        report.total_filled(),
        report.values_filled.len()
    );
    Ok((df, report))
}

/// Fill with the group median, then the column median.
///
/// Rows whose group value is itself missing go straight to the column median.
fn fill_median(df: DataFrame, name: &str, group: Option<&str>) -> Result<DataFrame> {
    let target = col(name).cast(DataType::Float64);
    let mut filled = target.clone();

    if let Some(g) = group {
        let group_median = when(col(g).is_not_null())
            .then(target.clone().median().over([col(g)]))
            .otherwise(lit(NULL));
        filled = filled.fill_null(group_median);
    }

    let filled = filled.fill_null(target.median()).alias(name);
    df.lazy()
        .with_column(filled)
        .collect()
        .with_context(|| format!("Failed to impute medians for {name}"))
}

fn fill_mode(df: DataFrame, name: &str, dtype: &DataType, mode: &ModeValue) -> Result<DataFrame> {
    let value = match mode {
        ModeValue::Int(v) => lit(*v).cast(dtype.clone()),
        ModeValue::UInt(v) => lit(*v).cast(dtype.clone()),
        ModeValue::Number(v) => lit(*v).cast(dtype.clone()),
        ModeValue::Text(s) => lit(s.as_str()),
    };
    df.lazy()
        .with_column(col(name).fill_null(value).alias(name))
        .collect()
        .with_context(|| format!("Failed to impute mode for {name}"))
}

/// Text column parsed as `Float64`, or `None` if any present value fails to parse.
fn coerce_to_numeric(df: &DataFrame, name: &str) -> Result<Option<Series>> {
    let original = df.column(name)?.as_materialized_series();
    let numeric = original.cast(&DataType::Float64)?;
    if numeric.null_count() > original.null_count() {
        return Ok(None);
    }
    Ok(Some(numeric))
}

/// Most frequent present value. Ties go to the value that appears first.
pub fn column_mode(series: &Series) -> Result<Option<ModeValue>> {
    if series.dtype().is_unsigned_integer() {
        let values = series.cast(&DataType::UInt64)?;
        Ok(first_mode(values.u64()?.into_iter()).map(ModeValue::UInt))
    } else if series.dtype().is_integer() {
        let values = series.cast(&DataType::Int64)?;
        Ok(first_mode(values.i64()?.into_iter()).map(ModeValue::Int))
    } else if series.dtype().is_primitive_numeric() {
        let numeric = series.cast(&DataType::Float64)?;
        // -0.0 and 0.0 count as the same value
        let bits = numeric
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| if x == 0.0 { 0u64 } else { x.to_bits() }));
        Ok(first_mode(bits).map(|b| ModeValue::Number(f64::from_bits(b))))
    } else {
        let text = series.cast(&DataType::String)?;
        let values = text.str()?.into_iter();
        Ok(first_mode(values).map(|s| ModeValue::Text(s.to_owned())))
    }
}

fn first_mode<K, I>(values: I) -> Option<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = Option<K>>,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut seen: Vec<(K, usize)> = Vec::new();

    for value in values.into_iter().flatten() {
        match slots.get(&value) {
            Some(&slot) => {
                if let Some(entry) = seen.get_mut(slot) {
                    entry.1 += 1;
                }
            }
            None => {
                slots.insert(value.clone(), seen.len());
                seen.push((value, 1));
            }
        }
    }

    let mut best: Option<(K, usize)> = None;
    for (value, count) in seen {
        if best.as_ref().is_none_or(|(_, top)| count > *top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(df
            .column(name)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .collect())
    }

    fn staff() -> Result<DataFrame> {
        let df = DataFrame::new(vec![
            Column::from(Series::new(
                "EmployeeID".into(),
                vec![1i64, 2, 3, 4, 5, 6, 7, 8, 9],
            )),
            Column::from(Series::new(
                "JobRole".into(),
                vec![
                    Some("Analyst"),
                    Some("Analyst"),
                    Some("Analyst"),
                    Some("Manager"),
                    Some("Manager"),
                    Some("Manager"),
                    Some("Manager"),
                    Some("Intern"),
                    None,
                ],
            )),
            Column::from(Series::new(
                "MonthlyIncome".into(),
                vec![
                    Some(3000i64),
                    Some(5000),
                    None,
                    Some(8000),
                    Some(9000),
                    Some(11_000),
                    None,
                    None,
                    None,
                ],
            )),
        ])?;
        Ok(df)
    }

    #[test]
    fn test_group_median_with_global_fallback() -> Result<()> {
        let (df, report) = impute(staff()?, &ImputeConfig::default(), &[])?;

        let income = f64_values(&df, "MonthlyIncome")?;
        // Analyst median of 3000, 5000
        assert_eq!(income[2], Some(4000.0));
        // Manager median of 8000, 9000, 11000
        assert_eq!(income[6], Some(9000.0));
        // Intern has no incomes and the last row has no role: column median
        assert_eq!(income[7], Some(8000.0));
        assert_eq!(income[8], Some(8000.0));
        // Present values untouched
        assert_eq!(income[0], Some(3000.0));

        assert_eq!(report.values_filled.get("MonthlyIncome"), Some(&4));
        Ok(())
    }

    #[test]
    fn test_group_column_imputed_after_its_dependents() -> Result<()> {
        let (df, report) = impute(staff()?, &ImputeConfig::default(), &[])?;

        // JobRole mode: Manager (4) beats Analyst (3)
        let roles = df.column("JobRole")?.as_materialized_series().clone();
        assert_eq!(roles.str()?.get(8), Some("Manager"));
        // If JobRole had been filled first, row 9 would have taken the Manager median
        assert_eq!(f64_values(&df, "MonthlyIncome")?[8], Some(8000.0));
        assert_eq!(report.values_filled.get("JobRole"), Some(&1));
        Ok(())
    }

    #[test]
    fn test_imputed_columns_have_no_gaps() -> Result<()> {
        let (df, report) = impute(staff()?, &ImputeConfig::default(), &[])?;
        for column in report.values_filled.keys() {
            assert_eq!(df.column(column)?.null_count(), 0, "{column} still has gaps");
        }
        Ok(())
    }

    #[test]
    fn test_missing_group_column_uses_column_median() -> Result<()> {
        let config = ImputeConfig {
            group_by: Some("Team".to_owned()),
            strategies: BTreeMap::new(),
        };
        let (df, report) = impute(staff()?, &config, &[])?;

        let income = f64_values(&df, "MonthlyIncome")?;
        assert_eq!(income[2], Some(8000.0));
        assert!(report.warnings.iter().any(|w| w.contains("Team")));
        Ok(())
    }

    #[test]
    fn test_mode_override_on_numeric_keeps_dtype() -> Result<()> {
        let df = DataFrame::new(vec![Column::from(Series::new(
            "JobSatisfaction".into(),
            vec![Some(3i64), Some(4), None, Some(4), Some(3)],
        ))])?;

        let (df, report) = impute(df, &ImputeConfig::default(), &[])?;
        let column = df.column("JobSatisfaction")?.as_materialized_series().clone();

        assert_eq!(column.dtype(), &DataType::Int64);
        // 3 and 4 tie; 3 was seen first
        assert_eq!(column.i64()?.get(2), Some(3));
        assert_eq!(report.values_filled.get("JobSatisfaction"), Some(&1));
        Ok(())
    }

    #[test]
    fn test_integer_mode_is_exact() -> Result<()> {
        // Above 2^53, where f64 can no longer tell neighbours apart
        let big = 9_007_199_254_740_993i64;
        let df = DataFrame::new(vec![Column::from(Series::new(
            "JobSatisfaction".into(),
            vec![Some(big), Some(big), None],
        ))])?;

        let (df, _) = impute(df, &ImputeConfig::default(), &[])?;
        let column = df.column("JobSatisfaction")?.as_materialized_series().clone();
        assert_eq!(column.i64()?.get(2), Some(big));

        let unsigned = Series::new("Level".into(), vec![Some(u64::MAX), None, Some(u64::MAX), Some(1)]);
        assert_eq!(column_mode(&unsigned)?, Some(ModeValue::UInt(u64::MAX)));
        Ok(())
    }

    #[test]
    fn test_mode_tie_break_is_first_encountered() -> Result<()> {
        let s = Series::new(
            "Gender".into(),
            vec![None, Some("Female"), Some("Male"), Some("Male"), Some("Female")],
        );
        assert_eq!(column_mode(&s)?, Some(ModeValue::Text("Female".to_owned())));

        let empty = Series::new("Gender".into(), vec![None::<&str>, None]);
        assert_eq!(column_mode(&empty)?, None);
        Ok(())
    }

    #[test]
    fn test_identifiers_and_skip_are_left_alone() -> Result<()> {
        let df = DataFrame::new(vec![
            Column::from(Series::new("EmployeeID".into(), vec![Some(1i64), None, Some(3)])),
            Column::from(Series::new("Notes".into(), vec![Some("a"), None, Some("a")])),
        ])?;
        let config = ImputeConfig {
            group_by: None,
            strategies: BTreeMap::from([("Notes".to_owned(), ImputeStrategy::Skip)]),
        };

        let (df, report) = impute(df, &config, &["EmployeeID".to_owned()])?;
        assert_eq!(df.column("EmployeeID")?.null_count(), 1);
        assert_eq!(df.column("Notes")?.null_count(), 1);
        assert!(report.values_filled.is_empty());
        assert_eq!(report.warnings.len(), 1);
        Ok(())
    }

    #[test]
    fn test_text_median_is_coerced_or_skipped() -> Result<()> {
        let df = DataFrame::new(vec![
            Column::from(Series::new("Bonus".into(), vec![Some("100"), None, Some("300")])),
            Column::from(Series::new("Grade".into(), vec![Some("A"), None, Some("12")])),
        ])?;
        let config = ImputeConfig {
            group_by: None,
            strategies: BTreeMap::from([
                ("Bonus".to_owned(), ImputeStrategy::Median),
                ("Grade".to_owned(), ImputeStrategy::Median),
            ]),
        };

        let (df, report) = impute(df, &config, &[])?;
        assert_eq!(f64_values(&df, "Bonus")?, vec![Some(100.0), Some(200.0), Some(300.0)]);
        assert_eq!(df.column("Grade")?.null_count(), 1);
        assert!(report.warnings.iter().any(|w| w.starts_with("Grade")));
        Ok(())
    }

    #[test]
    fn test_all_missing_column_is_reported() -> Result<()> {
        let df = DataFrame::new(vec![Column::from(Series::new(
            "Age".into(),
            vec![None::<f64>, None],
        ))])?;

        let (df, report) = impute(df, &ImputeConfig::default(), &[])?;
        assert_eq!(df.column("Age")?.null_count(), 2);
        assert!(report.values_filled.is_empty());
        assert!(report.warnings.iter().any(|w| w.contains("no values")));
        Ok(())
    }
}
