use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "PRODUCT_ANALYSIS_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub dataset: DatasetSection,
    pub cleaning: CleaningSection,
    pub report: ReportSection,
    pub cache: CacheSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSection {
    /// Rows sampled when inferring column types from an upload, 0 scans every row.
    pub infer_schema_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningSection {
    pub currency_symbols: Vec<String>,
    pub thousands_separator: String,
    pub unknown_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub preview_rows: usize,
    pub histogram_bins: usize,
    /// Cap on points carried by scatter panels, 0 keeps every point.
    pub max_scatter_points: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub capacity: usize,
}

impl AnalysisConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis config file: {}", path))?;

        let config: AnalysisConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse analysis config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve the config from an explicit path, then `PRODUCT_ANALYSIS_CONFIG`,
    /// then the built-in defaults.
    pub fn resolve(explicit_path: Option<&str>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        match env::var(CONFIG_ENV_VAR) {
            Ok(path) if Path::new(&path).exists() => Self::from_file(&path),
            Ok(path) => Err(anyhow!(
                "{} points to a missing file: {}",
                CONFIG_ENV_VAR,
                path
            )),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.report.histogram_bins == 0 {
            return Err(anyhow!("report.histogram_bins must be at least 1"));
        }

        if self.cache.capacity == 0 {
            return Err(anyhow!("cache.capacity must be at least 1"));
        }

        if self.cleaning.unknown_label.is_empty() {
            return Err(anyhow!("cleaning.unknown_label cannot be empty"));
        }

        if self.cleaning.currency_symbols.iter().any(|s| s.is_empty()) {
            return Err(anyhow!("cleaning.currency_symbols cannot contain empty entries"));
        }

        Ok(())
    }
}

impl Default for DatasetSection {
    fn default() -> Self {
        Self {
            infer_schema_rows: 0,
        }
    }
}

impl Default for CleaningSection {
    fn default() -> Self {
        Self {
            currency_symbols: vec!["₹".to_string()],
            thousands_separator: ",".to_string(),
            unknown_label: "Unknown".to_string(),
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            histogram_bins: 30,
            max_scatter_points: 0,
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self { capacity: 8 }
    }
}
