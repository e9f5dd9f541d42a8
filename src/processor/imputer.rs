use crate::models::CleaningSummary;
use anyhow::Result;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Row positions the imputer filled with the unknown label, per column.
#[derive(Debug, Clone, Default)]
pub struct ImputedCells {
    rows: HashMap<String, Vec<bool>>,
}

impl ImputedCells {
    pub fn is_imputed(&self, column: &str, row: usize) -> bool {
        self.rows
            .get(column)
            .and_then(|mask| mask.get(row))
            .copied()
            .unwrap_or(false)
    }
}

/// Fills missing cells: numeric columns with their median, text columns with a label.
///
/// Runs on the table as uploaded, so only columns the CSV reader already typed
/// as numeric get a median. Price and rating columns that arrive as text are
/// filled with the label here and coerced later. A column with no values at
/// all is typed as float and left missing.
pub struct MissingValueImputer {
    unknown_label: String,
}

impl MissingValueImputer {
    pub fn new(unknown_label: impl Into<String>) -> Self {
        Self {
            unknown_label: unknown_label.into(),
        }
    }

    pub fn impute(
        &self,
        df: &mut DataFrame,
        summary: &mut CleaningSummary,
    ) -> Result<ImputedCells> {
        let mut imputed = ImputedCells::default();
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for col_name in column_names {
            let column = df.column(&col_name)?.clone();
            let missing = column.null_count();
            if missing == 0 {
                continue;
            }

            if missing == column.len() {
                if !is_numeric_dtype(column.dtype()) {
                    df.with_column(column.cast(&DataType::Float64)?)?;
                }
                debug!("Column '{}' has no values, leaving it missing", col_name);
                continue;
            }

            if is_numeric_dtype(column.dtype()) {
                let as_float = column.cast(&DataType::Float64)?;
                let values = as_float.f64()?;

                let Some(median) = values.median() else {
                    continue;
                };

                let filled: Vec<Option<f64>> = values
                    .into_iter()
                    .map(|v| Some(v.unwrap_or(median)))
                    .collect();

                df.with_column(Column::new(col_name.as_str().into(), filled))?;
                debug!(
                    "Filled {} missing values in '{}' with median {}",
                    missing, col_name, median
                );
                summary.median_imputed.insert(col_name, missing);
            } else if column.dtype() == &DataType::String {
                let values = column.str()?;
                let mask: Vec<bool> = values.into_iter().map(|v| v.is_none()).collect();

                let filled: Vec<String> = values
                    .into_iter()
                    .map(|v| v.unwrap_or(self.unknown_label.as_str()).to_string())
                    .collect();

                df.with_column(Column::new(col_name.as_str().into(), filled))?;
                debug!(
                    "Filled {} missing values in '{}' with '{}'",
                    missing, col_name, self.unknown_label
                );
                imputed.rows.insert(col_name.clone(), mask);
                summary.label_imputed.insert(col_name, missing);
            }
        }

        Ok(imputed)
    }
}

impl Default for MissingValueImputer {
    fn default() -> Self {
        Self::new("Unknown")
    }
}
