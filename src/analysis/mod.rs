pub mod aggregations;
pub mod render;
pub mod report;

pub use render::{render_json, render_text};
pub use report::{AnalysisReport, Panel, ReportBuilder, ReportMetadata};
