//! kensa-analysis: repository analysis pipeline
//!
//! This crate turns a local source tree into a deduplicated, severity-ranked
//! issue report by coordinating two independent analyzer stages:
//! - Selector: bounded, deterministic file selection
//! - Parser: tree-sitter structural outlines with lexical fallback
//! - Rules: a fixed registry of pure static detectors
//! - AI: an LLM review client behind a substitutable provider interface
//! - Merge: canonicalization and overlap deduplication of findings
//! - Pipeline: the state machine tying the stages together with bounded
//!   concurrency and a partial-failure policy

pub mod ai;
pub mod core;
pub mod merge;
pub mod parser;
pub mod pipeline;
pub mod rules;
pub mod selector;

pub use crate::core::{
    AiConfig, AnalysisConfig, AnalyzerOrigin, Category, Finding, LineRange, MergedIssue,
    PipelineError, Severity,
};

pub use ai::{AiClient, AiError, AiProvider, AiRequest, AiResponse, MockProvider, OpenAiProvider};

pub use parser::{Language, ParserManager, StructuralUnit};

pub use rules::{Rule, RuleRegistry, StaticRuleEngine};

pub use merge::merge_findings;

pub use pipeline::{AnalysisPipeline, AnalysisReport, PipelineState, RunMetadata, SeverityCount};

pub use selector::{FileSelector, SkipReason, SkippedFile, SourceFile};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
