use crate::models::{
    ACTUAL_PRICE, DISCOUNT_PERCENTAGE, DISCOUNT_PRICE, DISCOUNT_SIZE, LOG_DISCOUNT_PRICE,
    LOG_NO_OF_RATINGS, NO_OF_RATINGS,
};
use anyhow::Result;
use polars::prelude::*;

/// Relative price reduction in percent.
///
/// Zero when the list price is missing or zero, when either price is missing,
/// or when the result is not a finite number. Never negative.
pub fn discount_percentage(actual_price: Option<f64>, discount_price: Option<f64>) -> f64 {
    match (actual_price, discount_price) {
        (Some(actual), Some(discount)) if actual != 0.0 => {
            let pct = (actual - discount) * 100.0 / actual;
            if pct.is_finite() && pct > 0.0 { pct } else { 0.0 }
        }
        _ => 0.0,
    }
}

/// Marker size for the discount scatter.
pub fn discount_size(discount_percentage: f64) -> f64 {
    discount_percentage.max(0.0).sqrt()
}

/// `ln(1 + x)`, missing when the input is missing or the result is not finite.
pub fn log1p(value: Option<f64>) -> Option<f64> {
    value.map(f64::ln_1p).filter(|v| v.is_finite())
}

pub struct DerivedMetrics;

impl DerivedMetrics {
    /// Adds `discount_percentage`, `discount_size`, `log_discount_price` and
    /// `log_no_of_ratings`. Expects the price and count columns already coerced
    /// to floats.
    pub fn add_derived_columns(&self, df: &mut DataFrame) -> Result<()> {
        let actual_prices: Vec<Option<f64>> = df.column(ACTUAL_PRICE)?.f64()?.into_iter().collect();
        let discount_prices: Vec<Option<f64>> =
            df.column(DISCOUNT_PRICE)?.f64()?.into_iter().collect();
        let rating_counts: Vec<Option<f64>> = df.column(NO_OF_RATINGS)?.f64()?.into_iter().collect();

        let percentages: Vec<f64> = actual_prices
            .iter()
            .zip(discount_prices.iter())
            .map(|(actual, discount)| discount_percentage(*actual, *discount))
            .collect();

        let sizes: Vec<f64> = percentages.iter().map(|p| discount_size(*p)).collect();

        let log_prices: Vec<Option<f64>> = discount_prices.iter().map(|p| log1p(*p)).collect();
        let log_counts: Vec<Option<f64>> = rating_counts.iter().map(|c| log1p(*c)).collect();

        df.with_column(Column::new(DISCOUNT_PERCENTAGE.into(), percentages))?;
        df.with_column(Column::new(DISCOUNT_SIZE.into(), sizes))?;
        df.with_column(Column::new(LOG_DISCOUNT_PRICE.into(), log_prices))?;
        df.with_column(Column::new(LOG_NO_OF_RATINGS.into(), log_counts))?;

        Ok(())
    }
}
