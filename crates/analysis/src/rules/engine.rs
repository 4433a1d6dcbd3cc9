use crate::core::Finding;
use crate::parser::{ParserManager, StructuralUnit};
use crate::rules::RuleRegistry;
use crate::selector::SourceFile;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::warn;

/// Per-file output of the static stage: the findings plus any rule-level
/// degradations that should surface as run warnings.
#[derive(Debug, Default)]
pub struct FileAnalysis {
    pub findings: Vec<Finding>,
    pub warnings: Vec<String>,
    pub fallback: bool,
}

/// Runs the registered rules over parsed units. Pure and deterministic:
/// identical input always yields identical, identically-ordered findings.
pub struct StaticRuleEngine {
    parsers: Arc<ParserManager>,
    registry: Arc<RuleRegistry>,
}

impl StaticRuleEngine {
    pub fn new(parsers: Arc<ParserManager>, registry: Arc<RuleRegistry>) -> Self {
        Self { parsers, registry }
    }

    /// Analyze one unit. Rules run in registration order; a rule failure
    /// degrades to a warning and never fails the file.
    pub fn analyze_unit(&self, unit: &StructuralUnit) -> FileAnalysis {
        let mut analysis = FileAnalysis {
            fallback: unit.is_fallback(),
            ..Default::default()
        };

        for rule in self.registry.rules() {
            if rule.needs_structure() && unit.is_fallback() {
                continue;
            }
            match rule.check(unit) {
                Ok(findings) => analysis.findings.extend(findings),
                Err(e) => {
                    warn!(rule = rule.id(), path = unit.path(), error = %e, "rule failed");
                    analysis
                        .warnings
                        .push(format!("rule {} failed on {}: {}", rule.id(), unit.path(), e));
                }
            }
        }

        analysis
            .findings
            .sort_by(|a, b| (a.range.start, &a.rule_id).cmp(&(b.range.start, &b.rule_id)));
        analysis
    }

    pub fn analyze_file(&self, file: Arc<SourceFile>) -> FileAnalysis {
        let unit = self.parsers.parse(file);
        self.analyze_unit(&unit)
    }

    /// Fan the file set out over a bounded worker pool. Output order matches
    /// input order regardless of scheduling.
    pub fn analyze_batch(
        &self,
        files: &[Arc<SourceFile>],
        worker_count: usize,
    ) -> Vec<FileAnalysis> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .build();

        match pool {
            Ok(pool) => pool.install(|| {
                files
                    .par_iter()
                    .map(|file| self.analyze_file(file.clone()))
                    .collect()
            }),
            Err(e) => {
                warn!(error = %e, "thread pool unavailable, analyzing sequentially");
                files
                    .iter()
                    .map(|file| self.analyze_file(file.clone()))
                    .collect()
            }
        }
    }
}
