use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAIN_CATEGORY: &str = "main_category";
pub const DISCOUNT_PRICE: &str = "discount_price";
pub const ACTUAL_PRICE: &str = "actual_price";
pub const RATINGS: &str = "ratings";
pub const NO_OF_RATINGS: &str = "no_of_ratings";

pub const DISCOUNT_PERCENTAGE: &str = "discount_percentage";
pub const DISCOUNT_SIZE: &str = "discount_size";
pub const LOG_DISCOUNT_PRICE: &str = "log_discount_price";
pub const LOG_NO_OF_RATINGS: &str = "log_no_of_ratings";

/// Columns an upload must carry once its headers are classified.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    MAIN_CATEGORY,
    DISCOUNT_PRICE,
    ACTUAL_PRICE,
    RATINGS,
    NO_OF_RATINGS,
];

/// A named byte stream submitted for analysis.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetShape {
    pub rows: usize,
    pub columns: usize,
}

impl DatasetShape {
    pub fn of(df: &polars::prelude::DataFrame) -> Self {
        Self {
            rows: df.height(),
            columns: df.width(),
        }
    }
}

/// What the cleaning pipeline did to one upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_in: usize,
    pub rows_out: usize,
    pub rows_dropped: usize,
    /// Missing cells filled with the column median, per column.
    pub median_imputed: BTreeMap<String, usize>,
    /// Missing cells filled with the unknown label, per column.
    pub label_imputed: BTreeMap<String, usize>,
    /// Present cells that failed numeric parsing and became missing, per column.
    pub coercion_failures: BTreeMap<String, usize>,
}

impl CleaningSummary {
    pub fn total_coercion_failures(&self) -> usize {
        self.coercion_failures.values().sum()
    }
}
