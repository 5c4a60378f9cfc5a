//! Categorical standardization.
//!
//! Each configured column has a vocabulary of canonical values and their
//! aliases. Values are matched on their trimmed, lowercased form, so
//! `" sales"`, `"SALES"` and `"Sales"` all become `"Sales"`. Values outside the
//! vocabulary pass through untouched.
//!
//! Every canonical value is registered as an alias of itself, which makes the
//! mapping idempotent: a second pass finds nothing to change.

use crate::config::StandardizeConfig;
use crate::error::{CleanError, Result, ResultExt as _};
use crate::report::{Stage, StageReport};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Lookup from normalized alias to canonical value for one column.
#[derive(Debug, Clone)]
pub struct AliasTable {
    lookup: HashMap<String, String>,
}

impl AliasTable {
    /// Build the table, rejecting aliases that resolve to two canonical values.
    pub fn from_vocabulary(column: &str, vocabulary: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut lookup: HashMap<String, String> = HashMap::new();

        for (canonical, aliases) in vocabulary {
            if canonical.trim().is_empty() {
                return Err(CleanError::Config(format!(
                    "{column}: canonical values must not be blank"
                )));
            }
            for alias in std::iter::once(canonical).chain(aliases) {
                let key = normalize_key(alias);
                match lookup.get(&key) {
                    Some(existing) if existing != canonical => {
                        return Err(CleanError::Config(format!(
                            "{column}: alias {alias:?} maps to both {existing:?} and {canonical:?}"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        lookup.insert(key, canonical.clone());
                    }
                }
            }
        }

        Ok(Self { lookup })
    }

    /// Canonical form of `value`, if the vocabulary knows it.
    pub fn canonical(&self, value: &str) -> Option<&str> {
        self.lookup.get(&normalize_key(value)).map(String::as_str)
    }

    /// Map a text column, returning the new series and how many values changed.
    pub fn apply(&self, values: &StringChunked) -> (Series, usize) {
        let mut changed = 0;
        let mapped: Vec<Option<String>> = values
            .into_iter()
            .map(|v| {
                v.map(|s| match self.canonical(s) {
                    Some(c) if c != s => {
                        changed += 1;
                        c.to_owned()
                    }
                    _ => s.to_owned(),
                })
            })
            .collect();
        (Series::new(values.name().clone(), mapped), changed)
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Standardize vocabulary columns and repair negative values in
/// `non_negative` columns.
pub fn standardize(df: DataFrame, config: &StandardizeConfig) -> Result<(DataFrame, StageReport)> {
    let mut report = StageReport::new(Stage::Standardize);
    let mut df = df;

    if df.height() == 0 {
        report.note("Empty table, nothing to standardize");
        return Ok((df, report));
    }

    for (column, vocabulary) in &config.vocabularies {
        let Ok(existing) = df.column(column) else {
            report.note(format!("{column}: not present, skipped"));
            continue;
        };
        let table = AliasTable::from_vocabulary(column, vocabulary)?;

        let series = existing.as_materialized_series();
        let coerced = !matches!(series.dtype(), DataType::String);
        let text = series
            .cast(&DataType::String)
            .with_context(|| format!("Failed to read {column} as text"))?;

        let (mapped, changed) = table.apply(text.str()?);
        if changed > 0 {
            df.with_column(mapped)?;
        }
        if coerced {
            report.warn(format!(
                "{column}: expected text, values compared as text{}",
                if changed > 0 { " and column converted" } else { "" }
            ));
        }

        report.values_standardized.insert(column.clone(), changed);
        report.note(format!("Standardized {changed} {column} values"));
    }

    for column in &config.non_negative {
        let Ok(existing) = df.column(column) else {
            report.note(format!("{column}: not present, skipped"));
            continue;
        };
        if !existing.dtype().is_primitive_numeric() {
            report.warn(format!(
                "{column}: expected a numeric column, sign check skipped"
            ));
            continue;
        }

        let negatives = count_negatives(&df, column)?;
        let mut fixed = 0;
        if negatives > 0 {
            let flipped = when(col(column.as_str()).lt(lit(0)))
                .then(lit(0) - col(column.as_str()))
                .otherwise(col(column.as_str()))
                .alias(column.as_str());
            df = df
                .lazy()
                .with_column(flipped)
                .collect()
                .with_context(|| format!("Failed to fix negative {column} values"))?;

            // The most negative integer has no positive counterpart and stays as is
            let remaining = count_negatives(&df, column)?;
            fixed = negatives - remaining;
            report.note(format!("Fixed {fixed} negative {column} values"));
            if remaining > 0 {
                report.warn(format!(
                    "{column}: {remaining} negative values could not be made positive"
                ));
            }
        }

        *report
            .values_standardized
            .entry(column.clone())
            .or_default() += fixed;
    }

    tracing::info!(
        "Standardized {} values across {} columns",
        report.total_standardized(),
        report.values_standardized.len()
    );
    Ok((df, report))
}

fn count_negatives(df: &DataFrame, column: &str) -> Result<usize> {
    let values = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().flatten().filter(|v| *v < 0.0).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        Ok(df
            .column(name)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_owned))
            .collect())
    }

    fn departments(values: Vec<Option<&str>>) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![Column::from(Series::new(
            "Department".into(),
            values,
        ))])?)
    }

    #[test]
    fn test_case_trim_and_alias_resolution() -> Result<()> {
        let df = departments(vec![
            Some("SALES"),
            Some("  sales "),
            Some("Sales"),
            Some("research & development"),
            Some("R&D"),
            Some("hr"),
            Some("Legal"),
            None,
        ])?;

        let (df, report) = standardize(df, &StandardizeConfig::default())?;
        let values = str_values(&df, "Department")?;

        assert_eq!(
            values,
            vec![
                Some("Sales".to_owned()),
                Some("Sales".to_owned()),
                Some("Sales".to_owned()),
                Some("Research & Development".to_owned()),
                Some("Research & Development".to_owned()),
                Some("Human Resources".to_owned()),
                Some("Legal".to_owned()),
                None,
            ]
        );
        // "Sales" already canonical, "Legal" unmapped, null untouched
        assert_eq!(report.values_standardized.get("Department"), Some(&5));
        Ok(())
    }

    #[test]
    fn test_gender_codes() -> Result<()> {
        let df = DataFrame::new(vec![Column::from(Series::new(
            "Gender".into(),
            vec!["M", "f", "Female", "m "],
        ))])?;

        let (df, report) = standardize(df, &StandardizeConfig::default())?;
        assert_eq!(
            str_values(&df, "Gender")?,
            vec![
                Some("Male".to_owned()),
                Some("Female".to_owned()),
                Some("Female".to_owned()),
                Some("Male".to_owned()),
            ]
        );
        assert_eq!(report.values_standardized.get("Gender"), Some(&3));
        Ok(())
    }

    #[test]
    fn test_negative_values_flipped_and_counted() -> Result<()> {
        let df = DataFrame::new(vec![Column::from(Series::new(
            "MonthlyIncome".into(),
            vec![Some(4200i64), Some(-3100), None, Some(-50)],
        ))])?;

        let (df, report) = standardize(df, &StandardizeConfig::default())?;
        let income: Vec<Option<i64>> = df
            .column("MonthlyIncome")?
            .as_materialized_series()
            .i64()?
            .into_iter()
            .collect();

        assert_eq!(income, vec![Some(4200), Some(3100), None, Some(50)]);
        assert_eq!(report.values_standardized.get("MonthlyIncome"), Some(&2));
        Ok(())
    }

    #[test]
    fn test_unflippable_negative_is_not_counted() -> Result<()> {
        let df = DataFrame::new(vec![Column::from(Series::new(
            "MonthlyIncome".into(),
            vec![Some(i64::MIN), Some(-5), None],
        ))])?;

        let (df, report) = standardize(df, &StandardizeConfig::default())?;
        let income: Vec<Option<i64>> = df
            .column("MonthlyIncome")?
            .as_materialized_series()
            .i64()?
            .into_iter()
            .collect();

        assert_eq!(income[1], Some(5));
        assert_eq!(report.values_standardized.get("MonthlyIncome"), Some(&1));
        assert!(report.warnings.iter().any(|w| w.contains("could not be made positive")));
        Ok(())
    }

    #[test]
    fn test_non_numeric_sign_column_is_warned() -> Result<()> {
        let df = DataFrame::new(vec![Column::from(Series::new(
            "MonthlyIncome".into(),
            vec!["-12", "40"],
        ))])?;

        let (df, report) = standardize(df, &StandardizeConfig::default())?;
        assert_eq!(str_values(&df, "MonthlyIncome")?[0].as_deref(), Some("-12"));
        assert_eq!(report.warnings.len(), 1);
        Ok(())
    }

    #[test]
    fn test_conflicting_aliases_rejected() {
        let vocabulary = BTreeMap::from([
            ("Sales".to_owned(), vec!["S".to_owned()]),
            ("Support".to_owned(), vec!["s".to_owned()]),
        ]);
        let err = AliasTable::from_vocabulary("Department", &vocabulary).unwrap_err();
        assert!(matches!(err, CleanError::Config(_)));
    }

    #[test]
    fn test_missing_columns_are_skipped() -> Result<()> {
        let df = DataFrame::new(vec![Column::from(Series::new("Age".into(), vec![30i64]))])?;
        let (df, report) = standardize(df, &StandardizeConfig::default())?;

        assert_eq!(df.width(), 1);
        assert_eq!(report.total_standardized(), 0);
        assert!(report.warnings.is_empty());
        Ok(())
    }

    fn department_value() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            prop::sample::select(vec![
                "sales", "SALES", " Sales ", "r&d", "Research & Development", "HR",
                "human resources", "Legal", "", "  ",
            ])
            .prop_map(|s| Some(s.to_owned())),
            "[a-zA-Z &]{0,12}".prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn prop_standardization_is_idempotent(values in prop::collection::vec(department_value(), 1..40)) {
            let df = DataFrame::new(vec![Column::from(Series::new("Department".into(), values))]).unwrap();
            let config = StandardizeConfig::default();

            let (once, _) = standardize(df, &config).unwrap();
            let (twice, report) = standardize(once.clone(), &config).unwrap();

            prop_assert!(once.equals_missing(&twice));
            prop_assert_eq!(report.total_standardized(), 0);
        }
    }
}
