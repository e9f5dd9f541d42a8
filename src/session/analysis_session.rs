use crate::analysis::{AnalysisReport, ReportBuilder};
use crate::cache::DatasetCache;
use crate::config::AnalysisConfig;
use crate::loader::CsvLoader;
use crate::models::Upload;
use crate::processor::CleaningPipeline;
use anyhow::{Context, Result};
use tracing::info;

/// One interactive analysis session: uploads in, reports out, cleaned
/// datasets shared across uploads with identical content.
pub struct AnalysisSession {
    loader: CsvLoader,
    pipeline: CleaningPipeline,
    cache: DatasetCache,
    builder: ReportBuilder,
    processed: usize,
    failed: usize,
}

impl AnalysisSession {
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let pipeline = CleaningPipeline::from_config(&config.cleaning)
            .context("Failed to initialize cleaning pipeline")?;

        Ok(Self {
            loader: CsvLoader::new(config.dataset.infer_schema_rows),
            pipeline,
            cache: DatasetCache::new(config.cache.capacity),
            builder: ReportBuilder::from_config(&config.report),
            processed: 0,
            failed: 0,
        })
    }

    /// Clean (or fetch from cache) and build the report for one upload.
    pub fn analyze(&mut self, upload: &Upload) -> Result<AnalysisReport> {
        let result = self.analyze_inner(upload);
        match &result {
            Ok(_) => self.processed += 1,
            Err(_) => self.failed += 1,
        }
        result
    }

    fn analyze_inner(&mut self, upload: &Upload) -> Result<AnalysisReport> {
        let loader = &self.loader;
        let pipeline = &self.pipeline;

        let entry = self.cache.get_or_clean(&upload.bytes, || {
            let raw = loader.load(upload)?;
            pipeline
                .run(raw)
                .with_context(|| format!("Failed to clean upload '{}'", upload.name))
        })?;

        if entry.hit {
            info!("♻️ Reusing cleaned dataset for '{}'", upload.name);
        }

        self.builder
            .build(&upload.name, &entry)
            .with_context(|| format!("Failed to build report for '{}'", upload.name))
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}
