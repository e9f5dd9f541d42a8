use crate::config::CleaningSection;
use crate::models::{
    ACTUAL_PRICE, CleaningSummary, DISCOUNT_PERCENTAGE, DISCOUNT_PRICE, NO_OF_RATINGS, RATINGS,
};
use crate::processor::{DerivedMetrics, FieldClassifier, MissingValueImputer, RuleNormalizer};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

/// The raw upload alongside its cleaned form.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub raw: DataFrame,
    pub cleaned: DataFrame,
    pub summary: CleaningSummary,
}

/// Impute, normalise prices, coerce counts, derive metrics, drop unusable rows.
///
/// Stages run in that order. Median imputation sees the table before any
/// coercion, so price and rating columns that arrive as text never receive a
/// median.
pub struct CleaningPipeline {
    classifier: FieldClassifier,
    imputer: MissingValueImputer,
    normalizer: RuleNormalizer,
    metrics: DerivedMetrics,
}

impl CleaningPipeline {
    pub fn from_config(config: &CleaningSection) -> Result<Self> {
        let normalizer =
            RuleNormalizer::new(&config.currency_symbols, &config.thousands_separator)
                .context("Failed to build currency pattern")?;

        Ok(Self {
            classifier: FieldClassifier::new(),
            imputer: MissingValueImputer::new(config.unknown_label.as_str()),
            normalizer,
            metrics: DerivedMetrics,
        })
    }

    pub fn run(&self, raw: DataFrame) -> Result<CleanedDataset> {
        let (cleaned, summary) = self.clean(&raw)?;
        Ok(CleanedDataset {
            raw,
            cleaned,
            summary,
        })
    }

    pub fn clean(&self, raw: &DataFrame) -> Result<(DataFrame, CleaningSummary)> {
        let mut df = raw.clone();
        let mut summary = CleaningSummary {
            rows_in: df.height(),
            ..Default::default()
        };

        self.classifier.map_to_canonical_schema(&mut df)?;
        self.classifier.ensure_required_columns(&df)?;

        let imputed = self.imputer.impute(&mut df, &mut summary)?;

        for column in [DISCOUNT_PRICE, ACTUAL_PRICE] {
            self.normalizer
                .normalize_price_column(&mut df, column, &imputed, &mut summary)?;
        }

        for column in [RATINGS, NO_OF_RATINGS] {
            self.normalizer
                .coerce_numeric_column(&mut df, column, &imputed, &mut summary)?;
        }

        self.metrics.add_derived_columns(&mut df)?;

        let df = self.drop_incomplete_rows(&df)?;

        summary.rows_out = df.height();
        summary.rows_dropped = summary.rows_in - summary.rows_out;

        info!(
            "Cleaned {} rows -> {} rows ({} dropped, {} unparseable values)",
            summary.rows_in,
            summary.rows_out,
            summary.rows_dropped,
            summary.total_coercion_failures()
        );

        Ok((df, summary))
    }

    fn drop_incomplete_rows(&self, df: &DataFrame) -> Result<DataFrame> {
        let percentages = df.column(DISCOUNT_PERCENTAGE)?.f64()?;
        let ratings = df.column(RATINGS)?.f64()?;

        let keep: Vec<bool> = percentages
            .into_iter()
            .zip(ratings.into_iter())
            .map(|(pct, rating)| pct.is_some() && rating.is_some())
            .collect();

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        Ok(df.filter(&mask)?)
    }
}

impl Default for CleaningPipeline {
    fn default() -> Self {
        Self {
            classifier: FieldClassifier::new(),
            imputer: MissingValueImputer::default(),
            normalizer: RuleNormalizer::default(),
            metrics: DerivedMetrics,
        }
    }
}
