use crate::models::CleaningSummary;
use crate::processor::imputer::{ImputedCells, is_numeric_dtype};
use anyhow::Result;
use polars::prelude::*;
use regex::Regex;
use std::str::FromStr;
use tracing::debug;

/// Turns price and count columns into nullable floats.
///
/// Every cell ends up as `Some(finite)` or `None`; text that does not parse is
/// never an error. Cells the imputer filled are not counted as failures.
pub struct RuleNormalizer {
    currency_regex: Option<Regex>,
}

impl RuleNormalizer {
    pub fn new(currency_symbols: &[String], thousands_separator: &str) -> Result<Self> {
        let alternatives: Vec<String> = currency_symbols
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(thousands_separator))
            .filter(|s| !s.is_empty())
            .map(regex::escape)
            .collect();

        let currency_regex = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&alternatives.join("|"))?)
        };

        Ok(Self { currency_regex })
    }

    /// `"₹1,299"` -> `Some(1299.0)`.
    pub fn parse_price(&self, raw: &str) -> Option<f64> {
        match &self.currency_regex {
            Some(re) => Self::parse_number(&re.replace_all(raw, "")),
            None => Self::parse_number(raw),
        }
    }

    pub fn parse_number(raw: &str) -> Option<f64> {
        f64::from_str(raw.trim()).ok().filter(|v| v.is_finite())
    }

    pub fn normalize_price_column(
        &self,
        df: &mut DataFrame,
        col_name: &str,
        imputed: &ImputedCells,
        summary: &mut CleaningSummary,
    ) -> Result<()> {
        self.coerce_with(df, col_name, imputed, summary, |s| self.parse_price(s))
    }

    pub fn coerce_numeric_column(
        &self,
        df: &mut DataFrame,
        col_name: &str,
        imputed: &ImputedCells,
        summary: &mut CleaningSummary,
    ) -> Result<()> {
        self.coerce_with(df, col_name, imputed, summary, Self::parse_number)
    }

    fn coerce_with<F>(
        &self,
        df: &mut DataFrame,
        col_name: &str,
        imputed: &ImputedCells,
        summary: &mut CleaningSummary,
        parse: F,
    ) -> Result<()>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let column = df.column(col_name)?.clone();
        let mut failures = 0;

        let normalized: Vec<Option<f64>> = if is_numeric_dtype(column.dtype()) {
            let as_float = column.cast(&DataType::Float64)?;
            as_float
                .f64()?
                .into_iter()
                .map(|v| v.filter(|f| f.is_finite()))
                .collect()
        } else {
            let as_text = column.cast(&DataType::String)?;
            as_text
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    let s = v?;
                    let parsed = parse(s);
                    if parsed.is_none()
                        && !s.trim().is_empty()
                        && !imputed.is_imputed(col_name, row)
                    {
                        failures += 1;
                    }
                    parsed
                })
                .collect()
        };

        if failures > 0 {
            debug!("{} values in '{}' could not be parsed", failures, col_name);
            summary
                .coercion_failures
                .insert(col_name.to_string(), failures);
        }

        df.with_column(Column::new(col_name.into(), normalized))?;
        Ok(())
    }
}

impl Default for RuleNormalizer {
    fn default() -> Self {
        Self {
            currency_regex: Regex::new("₹|,").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::MissingValueImputer;

    #[test]
    fn test_price_parsing() {
        let normalizer = RuleNormalizer::default();

        assert_eq!(normalizer.parse_price("₹1,299"), Some(1299.0));
        assert_eq!(normalizer.parse_price("  ₹ 32,999.50 "), Some(32999.5));
        assert_eq!(normalizer.parse_price("499"), Some(499.0));
        assert_eq!(normalizer.parse_price("₹"), None);
        assert_eq!(normalizer.parse_price("Unknown"), None);
        assert_eq!(normalizer.parse_price("inf"), None);
    }

    #[test]
    fn test_number_parsing_keeps_separators_significant() {
        assert_eq!(RuleNormalizer::parse_number(" 4.2 "), Some(4.2));
        assert_eq!(RuleNormalizer::parse_number("2,255"), None);
        assert_eq!(RuleNormalizer::parse_number("Get"), None);
        assert_eq!(RuleNormalizer::parse_number("NaN"), None);
    }

    #[test]
    fn test_custom_currency_symbols() {
        let normalizer =
            RuleNormalizer::new(&["$".to_string(), "USD".to_string()], ",").unwrap();

        assert_eq!(normalizer.parse_price("$1,050.25"), Some(1050.25));
        assert_eq!(normalizer.parse_price("USD 20"), Some(20.0));
        assert_eq!(normalizer.parse_price("₹20"), None);
    }

    #[test]
    fn test_normalize_price_column() {
        let normalizer = RuleNormalizer::default();
        let mut df = DataFrame::new(vec![
            Column::new("discount_price".into(), vec!["₹1,299", "free", "Unknown", "₹80"]),
        ])
        .unwrap();
        let mut summary = CleaningSummary::default();

        normalizer
            .normalize_price_column(&mut df, "discount_price", &ImputedCells::default(), &mut summary)
            .unwrap();

        let values: Vec<Option<f64>> = df.column("discount_price").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1299.0), None, None, Some(80.0)]);
        // "Unknown" was uploaded, not imputed, so it counts
        assert_eq!(summary.coercion_failures.get("discount_price"), Some(&2));
    }

    #[test]
    fn test_imputed_cells_are_not_failures() {
        let mut df = DataFrame::new(vec![
            Column::new("ratings".into(), vec![Some("Unknown"), None, Some("4.5")]),
        ])
        .unwrap();
        let mut summary = CleaningSummary::default();

        let imputed = MissingValueImputer::default().impute(&mut df, &mut summary).unwrap();
        RuleNormalizer::default()
            .coerce_numeric_column(&mut df, "ratings", &imputed, &mut summary)
            .unwrap();

        let values: Vec<Option<f64>> = df.column("ratings").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![None, None, Some(4.5)]);
        assert_eq!(summary.coercion_failures.get("ratings"), Some(&1));
    }

    #[test]
    fn test_coerce_already_numeric_column() {
        let normalizer = RuleNormalizer::default();
        let mut df = DataFrame::new(vec![
            Column::new("no_of_ratings".into(), vec![Some(10i64), None, Some(3)]),
        ])
        .unwrap();
        let mut summary = CleaningSummary::default();

        normalizer
            .coerce_numeric_column(&mut df, "no_of_ratings", &ImputedCells::default(), &mut summary)
            .unwrap();

        let column = df.column("no_of_ratings").unwrap();
        assert_eq!(column.dtype(), &DataType::Float64);
        let values: Vec<Option<f64>> = column.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(10.0), None, Some(3.0)]);
        assert!(summary.coercion_failures.is_empty());
    }
}
