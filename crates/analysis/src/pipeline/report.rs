use crate::core::{MergedIssue, Severity};
use crate::selector::SkippedFile;
use serde::{Deserialize, Serialize};

/// The sole long-lived output of a run. Immutable once assembled; rendering
/// and export belong to the consumer.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub issues: Vec<MergedIssue>,
    pub metadata: RunMetadata,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunMetadata {
    pub files_analyzed: usize,

    pub files_skipped: Vec<SkippedFile>,

    /// Static failures are file-scoped, so this is true for every run that
    /// got past selection.
    pub static_completed: bool,

    /// False when the AI stage was disabled, unreachable, cut by budget, or
    /// cancelled before every file got a verdict.
    pub ai_completed: bool,

    pub ai_calls: u32,

    pub errors: Vec<String>,

    pub warnings: Vec<String>,

    pub duration_ms: u64,
}

#[derive(Debug, Default, Serialize)]
pub struct SeverityCount {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl AnalysisReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn severity_counts(&self) -> SeverityCount {
        let mut count = SeverityCount::default();
        for issue in &self.issues {
            match issue.severity {
                Severity::Critical => count.critical += 1,
                Severity::High => count.high += 1,
                Severity::Medium => count.medium += 1,
                Severity::Low => count.low += 1,
                Severity::Info => count.info += 1,
            }
        }
        count
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, LineRange, MergedIssue};

    fn issue(severity: Severity) -> MergedIssue {
        MergedIssue {
            file: "a.py".to_string(),
            range: LineRange::single(1),
            category: Category::Logic,
            severity,
            title: "t".to_string(),
            message: "m".to_string(),
            suggestion: None,
            confidence: None,
            static_origin: true,
            ai_origin: false,
            merged_count: 1,
            sources: vec!["r".to_string()],
        }
    }

    #[test]
    fn test_severity_tally() {
        let report = AnalysisReport {
            issues: vec![
                issue(Severity::Critical),
                issue(Severity::High),
                issue(Severity::High),
                issue(Severity::Info),
            ],
            metadata: RunMetadata::default(),
        };
        let counts = report.severity_counts();
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.high, 2);
        assert_eq!(counts.info, 1);
        assert_eq!(counts.medium, 0);
    }

    #[test]
    fn test_report_serializes() {
        let report = AnalysisReport {
            issues: vec![issue(Severity::Low)],
            metadata: RunMetadata {
                files_analyzed: 1,
                static_completed: true,
                ..Default::default()
            },
        };
        let json = report.to_json().unwrap();
        assert!(json.contains("\"files_analyzed\": 1"));
        assert!(json.contains("\"static_completed\": true"));
    }
}
