use crate::analysis::aggregations::{
    self, CategoryCount, CategoryShare, CorrelationMatrix, GroupStats, HistogramBin,
    ScatterSeries,
};
use crate::cache::CacheEntry;
use crate::config::ReportSection;
use crate::models::{
    CleaningSummary, DISCOUNT_PERCENTAGE, DISCOUNT_PRICE, DISCOUNT_SIZE, DatasetShape,
    LOG_DISCOUNT_PRICE, LOG_NO_OF_RATINGS, MAIN_CATEGORY, NO_OF_RATINGS, RATINGS,
};
use crate::processor::is_numeric_dtype;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    Preview {
        title: String,
        shape: DatasetShape,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<CleaningSummary>,
    },
    CategoryCounts {
        title: String,
        counts: Vec<CategoryCount>,
    },
    Histogram {
        title: String,
        column: String,
        bins: Vec<HistogramBin>,
    },
    Scatter {
        title: String,
        series: ScatterSeries,
    },
    CategoryShare {
        title: String,
        shares: Vec<CategoryShare>,
    },
    GroupStats {
        title: String,
        column: String,
        groups: Vec<GroupStats>,
    },
    Correlation {
        title: String,
        matrix: CorrelationMatrix,
    },
}

impl Panel {
    pub fn title(&self) -> &str {
        match self {
            Panel::Preview { title, .. }
            | Panel::CategoryCounts { title, .. }
            | Panel::Histogram { title, .. }
            | Panel::Scatter { title, .. }
            | Panel::CategoryShare { title, .. }
            | Panel::GroupStats { title, .. }
            | Panel::Correlation { title, .. } => title,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub upload_name: String,
    pub content_hash: String,
    pub generated_at: DateTime<Utc>,
    pub from_cache: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub panels: Vec<Panel>,
}

pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

fn format_cell(value: AnyValue) -> String {
    match value {
        AnyValue::Null => "null".to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Builds the fixed sequence of panels for one cleaned upload.
pub struct ReportBuilder {
    preview_rows: usize,
    histogram_bins: usize,
    max_scatter_points: usize,
}

impl ReportBuilder {
    pub fn from_config(config: &ReportSection) -> Self {
        Self {
            preview_rows: config.preview_rows,
            histogram_bins: config.histogram_bins,
            max_scatter_points: config.max_scatter_points,
        }
    }

    pub fn build(&self, upload_name: &str, entry: &CacheEntry) -> Result<AnalysisReport> {
        let dataset = &entry.dataset;
        let df = &dataset.cleaned;

        let categories = text_values(df, MAIN_CATEGORY)?;
        let ratings = f64_values(df, RATINGS)?;
        let rating_counts = f64_values(df, NO_OF_RATINGS)?;
        let discount_prices = f64_values(df, DISCOUNT_PRICE)?;
        let percentages = f64_values(df, DISCOUNT_PERCENTAGE)?;
        let sizes = f64_values(df, DISCOUNT_SIZE)?;
        let log_prices = f64_values(df, LOG_DISCOUNT_PRICE)?;
        let log_counts = f64_values(df, LOG_NO_OF_RATINGS)?;

        let counts = aggregations::category_counts(&categories);
        let shares = aggregations::category_shares(&counts);

        let panels = vec![
            self.preview("Raw Data Preview", &dataset.raw, None)?,
            self.preview("Cleaned Data Preview", df, Some(dataset.summary.clone()))?,
            Panel::CategoryCounts {
                title: "Count of Main Categories".to_string(),
                counts,
            },
            Panel::Histogram {
                title: "Distribution of Ratings".to_string(),
                column: RATINGS.to_string(),
                bins: aggregations::histogram(&ratings, self.histogram_bins),
            },
            Panel::Scatter {
                title: "Discount Percentage vs Ratings".to_string(),
                series: aggregations::scatter(
                    DISCOUNT_PERCENTAGE,
                    &percentages,
                    RATINGS,
                    &ratings,
                    Some(&sizes),
                    self.max_scatter_points,
                ),
            },
            Panel::Scatter {
                title: "Log Discounted Price vs Log Number of Ratings".to_string(),
                series: aggregations::scatter(
                    LOG_DISCOUNT_PRICE,
                    &log_prices,
                    LOG_NO_OF_RATINGS,
                    &log_counts,
                    None,
                    self.max_scatter_points,
                ),
            },
            Panel::CategoryShare {
                title: "Product Distribution by Main Category".to_string(),
                shares,
            },
            Panel::GroupStats {
                title: "Main Category vs Number of Ratings".to_string(),
                column: NO_OF_RATINGS.to_string(),
                groups: aggregations::group_mean_std(&categories, &rating_counts),
            },
            Panel::Scatter {
                title: "Discounted Price vs Number of Ratings".to_string(),
                series: aggregations::scatter(
                    DISCOUNT_PRICE,
                    &discount_prices,
                    NO_OF_RATINGS,
                    &rating_counts,
                    None,
                    self.max_scatter_points,
                ),
            },
            Panel::Correlation {
                title: "Correlation Heatmap".to_string(),
                matrix: aggregations::correlation_matrix(&numeric_columns(df)?),
            },
        ];

        Ok(AnalysisReport {
            metadata: ReportMetadata {
                upload_name: upload_name.to_string(),
                content_hash: entry.key.clone(),
                generated_at: Utc::now(),
                from_cache: entry.hit,
            },
            panels,
        })
    }

    fn preview(
        &self,
        title: &str,
        df: &DataFrame,
        summary: Option<CleaningSummary>,
    ) -> Result<Panel> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let row_count = self.preview_rows.min(df.height());
        let mut rows = Vec::with_capacity(row_count);
        for i in 0..row_count {
            let row = df
                .get_columns()
                .iter()
                .map(|column| column.get(i).map(format_cell))
                .collect::<PolarsResult<Vec<String>>>()?;
            rows.push(row);
        }

        Ok(Panel::Preview {
            title: title.to_string(),
            shape: DatasetShape::of(df),
            columns,
            rows,
            summary,
        })
    }
}

/// Every numeric column of the cleaned table, as floats.
fn numeric_columns(df: &DataFrame) -> Result<Vec<(String, Vec<Option<f64>>)>> {
    df.get_columns()
        .iter()
        .filter(|column| is_numeric_dtype(column.dtype()))
        .map(|column| {
            let name = column.name().to_string();
            let values = f64_values(df, &name)?;
            Ok((name, values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DatasetCache;
    use crate::config::AnalysisConfig;
    use crate::models::ACTUAL_PRICE;
    use crate::processor::CleaningPipeline;

    fn raw() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                MAIN_CATEGORY.into(),
                vec!["toys", "toys", "home", "audio", "home", "toys"],
            ),
            Column::new(RATINGS.into(), vec!["4.5", "3.0", "4.0", "bad", "2.5", "5.0"]),
            Column::new(NO_OF_RATINGS.into(), vec!["10", "30", "5", "1", "7", "20"]),
            Column::new(
                DISCOUNT_PRICE.into(),
                vec!["₹50", "₹90", "₹1,000", "₹20", "₹400", "₹10"],
            ),
            Column::new(
                ACTUAL_PRICE.into(),
                vec!["₹100", "₹100", "₹2,000", "₹20", "₹500", "₹0"],
            ),
        ])
        .unwrap()
    }

    fn build_report() -> AnalysisReport {
        let config = AnalysisConfig::default();
        let pipeline = CleaningPipeline::from_config(&config.cleaning).unwrap();
        let mut cache = DatasetCache::new(1);
        let entry = cache
            .get_or_clean(b"fixture", || pipeline.run(raw()))
            .unwrap();

        ReportBuilder::from_config(&config.report)
            .build("fixture.csv", &entry)
            .unwrap()
    }

    #[test]
    fn test_panels_come_in_fixed_order() {
        let report = build_report();
        let titles: Vec<&str> = report.panels.iter().map(|p| p.title()).collect();

        assert_eq!(
            titles,
            vec![
                "Raw Data Preview",
                "Cleaned Data Preview",
                "Count of Main Categories",
                "Distribution of Ratings",
                "Discount Percentage vs Ratings",
                "Log Discounted Price vs Log Number of Ratings",
                "Product Distribution by Main Category",
                "Main Category vs Number of Ratings",
                "Discounted Price vs Number of Ratings",
                "Correlation Heatmap",
            ]
        );
        assert_eq!(report.metadata.upload_name, "fixture.csv");
        assert!(!report.metadata.from_cache);
    }

    #[test]
    fn test_previews_show_raw_and_cleaned_shapes() {
        let report = build_report();

        match &report.panels[0] {
            Panel::Preview { shape, rows, summary, .. } => {
                assert_eq!(*shape, DatasetShape { rows: 6, columns: 5 });
                assert_eq!(rows.len(), 5);
                assert_eq!(rows[0][1], "4.5");
                assert!(summary.is_none());
            }
            other => panic!("unexpected panel {:?}", other),
        }

        match &report.panels[1] {
            Panel::Preview { shape, summary, .. } => {
                assert_eq!(*shape, DatasetShape { rows: 5, columns: 9 });
                assert_eq!(summary.as_ref().unwrap().rows_dropped, 1);
            }
            other => panic!("unexpected panel {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_panels() {
        let report = build_report();

        match &report.panels[2] {
            Panel::CategoryCounts { counts, .. } => {
                assert_eq!(counts[0].category, "toys");
                assert_eq!(counts[0].count, 3);
                assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 5);
            }
            other => panic!("unexpected panel {:?}", other),
        }

        match &report.panels[3] {
            Panel::Histogram { bins, .. } => {
                assert_eq!(bins.len(), 30);
                assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
            }
            other => panic!("unexpected panel {:?}", other),
        }

        match &report.panels[7] {
            Panel::GroupStats { groups, .. } => {
                let toys = groups.iter().find(|g| g.category == "toys").unwrap();
                assert!((toys.mean - 20.0).abs() < 1e-9);
                assert!((toys.std - 10.0).abs() < 1e-9);
                let home = groups.iter().find(|g| g.category == "home").unwrap();
                assert!((home.mean - 6.0).abs() < 1e-9);
            }
            other => panic!("unexpected panel {:?}", other),
        }

        match &report.panels[9] {
            Panel::Correlation { matrix, .. } => {
                assert!(matrix.columns.contains(&DISCOUNT_PERCENTAGE.to_string()));
                assert!(matrix.columns.contains(&RATINGS.to_string()));
                assert!(!matrix.columns.contains(&MAIN_CATEGORY.to_string()));
                assert_eq!(matrix.values.len(), matrix.columns.len());
            }
            other => panic!("unexpected panel {:?}", other),
        }
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = build_report();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["panels"][0]["kind"], "preview");
        assert_eq!(json["panels"][4]["kind"], "scatter");
        assert_eq!(json["metadata"]["upload_name"], "fixture.csv");
    }
}
