use crate::analysis::aggregations::{CorrelationMatrix, ScatterSeries};
use crate::analysis::report::{AnalysisReport, Panel};
use crate::models::CleaningSummary;
use anyhow::Result;
use std::fmt::Write;

const BAR_WIDTH: usize = 40;
const LABEL_WIDTH: usize = 28;

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let filled = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

fn truncate(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        let kept: String = label.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "n/a".to_string())
}

pub fn render_json(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Plain-text rendering of every panel, in report order.
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let meta = &report.metadata;

    let _ = writeln!(out, "=== Product Analysis: {} ===", meta.upload_name);
    let _ = writeln!(
        out,
        "sha256 {} | generated {}{}",
        meta.content_hash,
        meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if meta.from_cache { " | cached" } else { "" }
    );

    for (index, panel) in report.panels.iter().enumerate() {
        let _ = writeln!(out, "\n[{}] {}", index + 1, panel.title());
        render_panel(&mut out, panel);
    }

    out
}

fn render_panel(out: &mut String, panel: &Panel) {
    match panel {
        Panel::Preview {
            shape,
            columns,
            rows,
            summary,
            ..
        } => {
            let _ = writeln!(out, "{} rows x {} columns", shape.rows, shape.columns);
            let _ = writeln!(out, "{}", columns.join(" | "));
            for row in rows {
                let _ = writeln!(out, "{}", row.join(" | "));
            }
            if let Some(summary) = summary {
                render_summary(out, summary);
            }
        }
        Panel::CategoryCounts { counts, .. } => {
            let max = counts.iter().map(|c| c.count).max().unwrap_or(0) as f64;
            for c in counts {
                let _ = writeln!(
                    out,
                    "{:<width$} {:>7} {}",
                    truncate(&c.category, LABEL_WIDTH),
                    c.count,
                    bar(c.count as f64, max),
                    width = LABEL_WIDTH
                );
            }
        }
        Panel::Histogram { column, bins, .. } => {
            if bins.is_empty() {
                let _ = writeln!(out, "no values in '{}'", column);
            }
            let max = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
            for b in bins {
                let _ = writeln!(
                    out,
                    "[{:>8.3}, {:>8.3}] {:>7} {}",
                    b.lower,
                    b.upper,
                    b.count,
                    bar(b.count as f64, max)
                );
            }
        }
        Panel::Scatter { series, .. } => render_scatter(out, series),
        Panel::CategoryShare { shares, .. } => {
            for s in shares {
                let _ = writeln!(
                    out,
                    "{:<width$} {:>6.2}% {}",
                    truncate(&s.category, LABEL_WIDTH),
                    s.percent,
                    bar(s.percent, 100.0),
                    width = LABEL_WIDTH
                );
            }
        }
        Panel::GroupStats { column, groups, .. } => {
            let _ = writeln!(out, "mean and std of '{}'", column);
            let max = groups.iter().map(|g| g.mean).fold(0.0, f64::max);
            for g in groups {
                let _ = writeln!(
                    out,
                    "{:<width$} mean {:>12.2} std {:>12.2} {}",
                    truncate(&g.category, LABEL_WIDTH),
                    g.mean,
                    g.std,
                    bar(g.mean, max),
                    width = LABEL_WIDTH
                );
            }
        }
        Panel::Correlation { matrix, .. } => render_matrix(out, matrix),
    }
}

fn render_summary(out: &mut String, summary: &CleaningSummary) {
    let _ = writeln!(
        out,
        "rows in {} | rows out {} | dropped {}",
        summary.rows_in, summary.rows_out, summary.rows_dropped
    );
    for (column, count) in &summary.median_imputed {
        let _ = writeln!(out, "  {}: {} filled with median", column, count);
    }
    for (column, count) in &summary.label_imputed {
        let _ = writeln!(out, "  {}: {} filled with label", column, count);
    }
    for (column, count) in &summary.coercion_failures {
        let _ = writeln!(out, "  {}: {} unparseable", column, count);
    }
}

fn render_scatter(out: &mut String, series: &ScatterSeries) {
    let s = &series.summary;
    let _ = writeln!(out, "{} vs {}: {} points", series.x, series.y, s.count);
    if let (Some((x_min, x_max)), Some((y_min, y_max))) = (s.x_range, s.y_range) {
        let _ = writeln!(out, "  x range [{:.3}, {:.3}]", x_min, x_max);
        let _ = writeln!(out, "  y range [{:.3}, {:.3}]", y_min, y_max);
    }
    let _ = writeln!(out, "  pearson r {}", fmt_opt(s.correlation));
}

fn render_matrix(out: &mut String, matrix: &CorrelationMatrix) {
    const CELL: usize = 10;

    let _ = write!(out, "{:<width$}", "", width = LABEL_WIDTH);
    for name in &matrix.columns {
        let _ = write!(out, "{:>width$}", truncate(name, CELL - 1), width = CELL);
    }
    let _ = writeln!(out);

    for (name, row) in matrix.columns.iter().zip(matrix.values.iter()) {
        let _ = write!(out, "{:<width$}", truncate(name, LABEL_WIDTH), width = LABEL_WIDTH);
        for value in row {
            let _ = write!(out, "{:>width$}", fmt_opt(*value), width = CELL);
        }
        let _ = writeln!(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregations::{CategoryCount, ScatterSummary};
    use crate::analysis::report::ReportMetadata;
    use chrono::{TimeZone, Utc};

    fn report(panels: Vec<Panel>) -> AnalysisReport {
        AnalysisReport {
            metadata: ReportMetadata {
                upload_name: "listings.csv".to_string(),
                content_hash: "abc123".to_string(),
                generated_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
                from_cache: true,
            },
            panels,
        }
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10.0, 10.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(5.0, 10.0).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(1.0, 0.0), "");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long category name", 6), "a ver…");
    }

    #[test]
    fn test_render_text_headers() {
        let text = render_text(&report(vec![Panel::CategoryCounts {
            title: "Count of Main Categories".to_string(),
            counts: vec![CategoryCount {
                category: "toys".to_string(),
                count: 3,
            }],
        }]));

        assert!(text.contains("=== Product Analysis: listings.csv ==="));
        assert!(text.contains("2025-03-01 12:00:00 UTC | cached"));
        assert!(text.contains("[1] Count of Main Categories"));
        assert!(text.contains("toys"));
    }

    #[test]
    fn test_render_scatter_without_points() {
        let text = render_text(&report(vec![Panel::Scatter {
            title: "Discount Percentage vs Ratings".to_string(),
            series: ScatterSeries {
                x: "discount_percentage".to_string(),
                y: "ratings".to_string(),
                summary: ScatterSummary {
                    count: 0,
                    x_range: None,
                    y_range: None,
                    correlation: None,
                },
                points: Vec::new(),
            },
        }]));

        assert!(text.contains("discount_percentage vs ratings: 0 points"));
        assert!(text.contains("pearson r n/a"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&report(Vec::new())).unwrap();
        assert!(json.contains("\"upload_name\": \"listings.csv\""));
        assert!(json.contains("\"from_cache\": true"));
    }
}
