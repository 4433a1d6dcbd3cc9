//! The pipeline orchestrator: a five-state machine driving selection,
//! parallel static analysis, budget-bounded AI analysis, and deterministic
//! merge. Its defining property: total failure of the external reasoning
//! service degrades the report to static-only instead of failing the run.

use crate::ai::{AiClient, AiProvider, AiSkip};
use crate::core::{AnalysisConfig, Finding, PipelineError};
use crate::merge::merge_findings;
use crate::parser::ParserManager;
use crate::pipeline::report::{AnalysisReport, RunMetadata};
use crate::rules::{RuleRegistry, StaticRuleEngine};
use crate::selector::{FileSelector, SkipReason, SkippedFile, SourceFile};
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Selecting,
    StaticAnalyzing,
    AiAnalyzing,
    Normalizing,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selecting => write!(f, "selecting"),
            Self::StaticAnalyzing => write!(f, "static-analyzing"),
            Self::AiAnalyzing => write!(f, "ai-analyzing"),
            Self::Normalizing => write!(f, "normalizing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Accumulated output of the AI stage. The collector is the only mutable
/// state shared between workers.
#[derive(Default)]
struct AiStageOutcome {
    findings: Vec<Finding>,
    skipped: Vec<SkippedFile>,
    warnings: Vec<String>,
    completed_paths: HashSet<String>,
}

pub struct AnalysisPipeline {
    config: AnalysisConfig,
    engine: Arc<StaticRuleEngine>,
    ai: Option<Arc<AiClient>>,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let engine = Arc::new(StaticRuleEngine::new(
            Arc::new(ParserManager::new()),
            Arc::new(RuleRegistry::with_defaults()),
        ));
        Ok(Self {
            config,
            engine,
            ai: None,
        })
    }

    /// Replace the default rule set. Meant for callers that extend or trim
    /// the registry before a run.
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.engine = Arc::new(StaticRuleEngine::new(
            Arc::new(ParserManager::new()),
            Arc::new(registry),
        ));
        self
    }

    /// Attach the reasoning provider. Without one the pipeline runs
    /// static-only and reports `ai_completed = false`.
    pub fn with_provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.ai = Some(Arc::new(AiClient::new(provider, self.config.ai.clone())));
        self
    }

    pub async fn run(&self, root: &Path) -> Result<AnalysisReport, PipelineError> {
        let start = Instant::now();
        let mut state = PipelineState::Selecting;
        info!(state = %state, root = %root.display(), "pipeline starting");

        if !root.is_dir() {
            warn!(state = %PipelineState::Failed, "root is not a directory");
            return Err(PipelineError::NoFilesSelected(root.display().to_string()));
        }

        let selector = FileSelector::new(&self.config)
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        let outcome = selector
            .select(root)
            .map_err(|e| PipelineError::Selection(e.to_string()))?;

        let files: Vec<Arc<SourceFile>> = outcome.files.into_iter().map(Arc::new).collect();
        let mut skipped = outcome.skipped;
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if outcome.truncated {
            warnings.push(format!(
                "file set truncated to max_files={}",
                self.config.max_files
            ));
        }

        state = PipelineState::StaticAnalyzing;
        info!(state = %state, files = files.len(), "running static rules");

        let mut all_findings: Vec<Finding> = Vec::new();
        {
            let engine = self.engine.clone();
            let batch = files.clone();
            let worker_count = self.config.static_worker_count;
            let handle =
                tokio::task::spawn_blocking(move || engine.analyze_batch(&batch, worker_count));

            match handle.await {
                Ok(results) => {
                    for (file, analysis) in files.iter().zip(results) {
                        if analysis.fallback {
                            warnings.push(format!(
                                "{}: structural parse unavailable, text rules only",
                                file.path
                            ));
                        }
                        warnings.extend(analysis.warnings);
                        all_findings.extend(analysis.findings);
                    }
                }
                Err(e) => {
                    // A panicking rule loses the static stage's output but
                    // must not lose the run.
                    errors.push(format!("static analysis aborted: {}", e));
                }
            }
        }
        // Static failures are file-scoped by construction, never run-fatal.
        let static_completed = true;

        state = PipelineState::AiAnalyzing;
        let ai_client = if self.config.ai.enabled {
            self.ai.clone()
        } else {
            None
        };
        let mut ai_completed = false;
        let mut ai_calls = 0;

        match ai_client {
            Some(client) if !files.is_empty() => {
                info!(state = %state, files = files.len(), budget = self.config.ai.call_budget, "running AI review");

                let outcome = self.run_ai_stage(client.clone(), &files).await;
                ai_calls = client.calls_used();
                ai_completed = outcome.skipped.is_empty()
                    && outcome.completed_paths.len() == files.len();

                all_findings.extend(outcome.findings);
                warnings.extend(outcome.warnings);
                skipped.extend(outcome.skipped);
            }
            Some(_) => {
                // Nothing to review; the stage trivially completed.
                ai_completed = true;
                info!(state = %state, "no files for AI review");
            }
            None => {
                warnings
                    .push("AI analysis disabled; report contains static findings only".to_string());
                info!(state = %state, "AI stage skipped");
            }
        }

        state = PipelineState::Normalizing;
        info!(state = %state, findings = all_findings.len(), "merging findings");
        let issues = merge_findings(all_findings);

        state = PipelineState::Done;
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(state = %state, issues = issues.len(), duration_ms, "pipeline complete");

        Ok(AnalysisReport {
            issues,
            metadata: RunMetadata {
                files_analyzed: files.len(),
                files_skipped: skipped,
                static_completed,
                ai_completed,
                ai_calls,
                errors,
                warnings,
                duration_ms,
            },
        })
    }

    /// Fan the AI review out with bounded concurrency, collect through one
    /// accumulation point, and cut the stage at the overall run timeout.
    /// Cancellation keeps whatever completed; pending files are recorded as
    /// skipped, and the run proceeds to Normalizing regardless.
    async fn run_ai_stage(
        &self,
        client: Arc<AiClient>,
        files: &[Arc<SourceFile>],
    ) -> AiStageOutcome {
        let collector = Arc::new(Mutex::new(AiStageOutcome::default()));

        let drive = {
            let collector = collector.clone();
            futures::stream::iter(files.iter().cloned())
                .for_each_concurrent(Some(self.config.ai_worker_count), move |file| {
                    let client = client.clone();
                    let collector = collector.clone();
                    async move {
                        let result = client.review_file(&file).await;
                        let mut outcome = collector.lock();
                        outcome.completed_paths.insert(file.path.clone());
                        match result {
                            Ok(review) => {
                                outcome.findings.extend(review.findings);
                                outcome.warnings.extend(review.warnings);
                            }
                            Err(skip) => {
                                let reason = match &skip {
                                    AiSkip::Budget => SkipReason::AiBudget,
                                    AiSkip::Timeout => SkipReason::AiTimeout,
                                    AiSkip::Failed(_) => SkipReason::AiFailed,
                                };
                                warn!(path = %file.path, reason = %skip, "AI review skipped");
                                outcome.skipped.push(
                                    SkippedFile::new(file.path.clone(), reason)
                                        .with_detail(skip.to_string()),
                                );
                            }
                        }
                    }
                })
        };

        let cancelled = match self.config.overall_run_timeout() {
            Some(limit) => tokio::time::timeout(limit, drive).await.is_err(),
            None => {
                drive.await;
                false
            }
        };

        let mut outcome = std::mem::take(&mut *collector.lock());

        if cancelled {
            warn!("overall run timeout reached, abandoning in-flight AI reviews");
            for file in files {
                if !outcome.completed_paths.contains(&file.path) {
                    outcome
                        .skipped
                        .push(SkippedFile::new(file.path.clone(), SkipReason::Cancelled));
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_fatal_before_start() {
        let mut config = AnalysisConfig::default();
        config.max_files = 0;
        assert!(matches!(
            AnalysisPipeline::new(config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_root_fails_from_selecting() {
        let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
        let result = pipeline.run(Path::new("/nonexistent/kensa-root")).await;
        assert!(matches!(result, Err(PipelineError::NoFilesSelected(_))));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::AiAnalyzing.to_string(), "ai-analyzing");
        assert_eq!(PipelineState::Done.to_string(), "done");
    }
}
