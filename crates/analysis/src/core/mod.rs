//! Core data model shared by every pipeline stage: severities and categories,
//! the finding/issue records both analyzers feed into, the run configuration,
//! and the fatal error taxonomy.

pub mod config;
pub mod error;
pub mod finding;
pub mod severity;

pub use config::{AiConfig, AnalysisConfig};
pub use error::PipelineError;
pub use finding::{AnalyzerOrigin, Finding, LineRange, MergedIssue};
pub use severity::{Category, Severity};
