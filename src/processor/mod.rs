pub mod cleaning_pipeline;
pub mod derived_metrics;
pub mod field_classifier;
pub mod imputer;
pub mod rule_normalizer;

pub use cleaning_pipeline::*;
pub use derived_metrics::*;
pub use field_classifier::*;
pub use imputer::*;
pub use rule_normalizer::*;
