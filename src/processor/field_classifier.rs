use crate::models::REQUIRED_COLUMNS;
use anyhow::{Result, anyhow};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Maps the header names found in an upload onto the canonical listing schema.
pub struct FieldClassifier {
    field_mappings: HashMap<String, String>,
}

impl FieldClassifier {
    pub fn new() -> Self {
        let mut field_mappings = HashMap::new();

        // Canonical names map to themselves
        for canonical in REQUIRED_COLUMNS {
            field_mappings.insert(canonical.to_string(), canonical.to_string());
        }

        // Category variations
        field_mappings.insert("category".to_string(), "main_category".to_string());
        field_mappings.insert("product_category".to_string(), "main_category".to_string());
        field_mappings.insert("category_name".to_string(), "main_category".to_string());

        // Selling price variations
        field_mappings.insert("discounted_price".to_string(), "discount_price".to_string());
        field_mappings.insert("selling_price".to_string(), "discount_price".to_string());
        field_mappings.insert("sale_price".to_string(), "discount_price".to_string());
        field_mappings.insert("special_price".to_string(), "discount_price".to_string());

        // List price variations
        field_mappings.insert("mrp".to_string(), "actual_price".to_string());
        field_mappings.insert("original_price".to_string(), "actual_price".to_string());
        field_mappings.insert("list_price".to_string(), "actual_price".to_string());

        // Rating variations
        field_mappings.insert("rating".to_string(), "ratings".to_string());
        field_mappings.insert("stars".to_string(), "ratings".to_string());
        field_mappings.insert("average_rating".to_string(), "ratings".to_string());

        // Rating count variations
        field_mappings.insert("num_ratings".to_string(), "no_of_ratings".to_string());
        field_mappings.insert("number_of_ratings".to_string(), "no_of_ratings".to_string());
        field_mappings.insert("rating_count".to_string(), "no_of_ratings".to_string());
        field_mappings.insert("ratings_count".to_string(), "no_of_ratings".to_string());

        FieldClassifier { field_mappings }
    }

    /// Canonical name for a header, or the trimmed header when nothing matches.
    pub fn classify_field(&self, field_name: &str) -> String {
        let normalized_field = self.normalize_field_name(field_name);

        for (pattern, canonical) in &self.field_mappings {
            if normalized_field == self.normalize_field_name(pattern) {
                return canonical.clone();
            }
        }

        field_name.trim().to_string()
    }

    fn normalize_field_name(&self, name: &str) -> String {
        name.trim()
            .to_lowercase()
            .replace(['_', '-', ' ', '.'], "")
    }

    pub fn add_field_mapping(&mut self, from: String, to: String) {
        self.field_mappings.insert(from, to);
    }

    /// Rename every header to its canonical form. A header whose canonical name
    /// is already taken by another column keeps its original name.
    pub fn map_to_canonical_schema(&self, df: &mut DataFrame) -> Result<()> {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for col_name in column_names {
            let canonical_name = self.classify_field(&col_name);
            if canonical_name == col_name {
                continue;
            }

            let taken = df
                .get_column_names()
                .iter()
                .any(|existing| existing.as_str() == canonical_name);
            if taken {
                warn!(
                    "Column '{}' also classifies as '{}', keeping original name",
                    col_name, canonical_name
                );
                continue;
            }

            debug!("Renaming column '{}' -> '{}'", col_name, canonical_name);
            df.rename(&col_name, canonical_name.into())?;
        }

        Ok(())
    }

    pub fn missing_required_columns(&self, df: &DataFrame) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|required| df.column(required).is_err())
            .collect()
    }

    pub fn ensure_required_columns(&self, df: &DataFrame) -> Result<()> {
        let missing = self.missing_required_columns(df);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "missing required column(s): {}",
                missing.join(", ")
            ))
        }
    }
}

impl Default for FieldClassifier {
    fn default() -> Self {
        Self::new()
    }
}
