//! Pipeline orchestration and the final report types.

pub mod orchestrator;
pub mod report;

pub use orchestrator::{AnalysisPipeline, PipelineState};
pub use report::{AnalysisReport, RunMetadata, SeverityCount};
