use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub category: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSummary {
    pub count: usize,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub x: String,
    pub y: String,
    pub summary: ScatterSummary,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major coefficients, `None` where the coefficient is undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

/// Rows per category, largest first, ties by name.
pub fn category_counts(categories: &[String]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for category in categories {
        *counts.entry(category.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    counts
}

pub fn category_shares(counts: &[CategoryCount]) -> Vec<CategoryShare> {
    let total: usize = counts.iter().map(|c| c.count).sum();

    counts
        .iter()
        .map(|c| CategoryShare {
            category: c.category.clone(),
            count: c.count,
            percent: if total == 0 {
                0.0
            } else {
                c.count as f64 * 100.0 / total as f64
            },
        })
        .collect()
}

/// Equal-width histogram over the range of `values`. Missing values are skipped.
pub fn histogram(values: &[Option<f64>], bins: usize) -> Vec<HistogramBin> {
    let present: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if present.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: present.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for value in present {
        let index = (((value - min) / width).floor() as usize).min(bins - 1);
        result[index].count += 1;
    }

    result
}

/// Mean and sample standard deviation of `values` per category, sorted by name.
/// Undefined statistics (no values, or one value for the deviation) are 0.
pub fn group_mean_std(categories: &[String], values: &[Option<f64>]) -> Vec<GroupStats> {
    let mut groups: BTreeMap<&str, (usize, Vec<f64>)> = BTreeMap::new();

    for (category, value) in categories.iter().zip(values.iter()) {
        let entry = groups.entry(category.as_str()).or_insert_with(|| (0, Vec::new()));
        entry.0 += 1;
        if let Some(v) = value.filter(|v| v.is_finite()) {
            entry.1.push(v);
        }
    }

    groups
        .into_iter()
        .map(|(category, (count, present))| {
            let n = present.len() as f64;
            let mean = if present.is_empty() {
                0.0
            } else {
                present.iter().sum::<f64>() / n
            };
            let std = if present.len() < 2 {
                0.0
            } else {
                let ss: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
                (ss / (n - 1.0)).sqrt()
            };

            GroupStats {
                category: category.to_string(),
                count,
                mean,
                std,
            }
        })
        .collect()
}

/// Pearson correlation over the positions where both series are present (non-NaN).
pub fn pearson(xs: ArrayView1<f64>, ys: ArrayView1<f64>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    Some(r.clamp(-1.0, 1.0))
}

fn to_nan_array(columns: &[(String, Vec<Option<f64>>)]) -> Array2<f64> {
    let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
    Array2::from_shape_fn((rows, columns.len()), |(row, col)| {
        columns[col].1.get(row).copied().flatten().unwrap_or(f64::NAN)
    })
}

/// Pairwise-complete Pearson correlation between every pair of columns.
pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let data = to_nan_array(columns);
    let n = columns.len();

    let values = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let r = pearson(data.column(i), data.column(j));
                    // A defined self-correlation is exactly 1
                    if i == j { r.map(|_| 1.0) } else { r }
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

/// Pair up two series for a scatter panel, skipping rows where either is missing.
/// At most `max_points` points are kept (evenly spaced, 0 keeps all); the summary
/// always covers every point.
pub fn scatter(
    x_label: &str,
    xs: &[Option<f64>],
    y_label: &str,
    ys: &[Option<f64>],
    sizes: Option<&[Option<f64>]>,
    max_points: usize,
) -> ScatterSeries {
    let points: Vec<ScatterPoint> = xs
        .iter()
        .zip(ys.iter())
        .enumerate()
        .filter_map(|(i, (x, y))| {
            let (x, y) = ((*x)?, (*y)?);
            Some(ScatterPoint {
                x,
                y,
                size: sizes.and_then(|s| s.get(i).copied().flatten()),
            })
        })
        .collect();

    let range = |values: Vec<f64>| -> Option<(f64, f64)> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    };

    let px: Vec<f64> = points.iter().map(|p| p.x).collect();
    let py: Vec<f64> = points.iter().map(|p| p.y).collect();
    let correlation = pearson(ArrayView1::from(&px[..]), ArrayView1::from(&py[..]));

    let summary = ScatterSummary {
        count: points.len(),
        x_range: range(px),
        y_range: range(py),
        correlation,
    };

    let points = if max_points > 0 && points.len() > max_points {
        let stride = points.len() as f64 / max_points as f64;
        (0..max_points)
            .map(|i| points[(i as f64 * stride) as usize].clone())
            .collect()
    } else {
        points
    };

    ScatterSeries {
        x: x_label.to_string(),
        y: y_label.to_string(),
        summary,
        points,
    }
}
