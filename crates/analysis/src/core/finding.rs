use crate::core::{Category, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based, inclusive line span. `end >= start` always holds after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        let start = start.max(1);
        let end = end.max(start);
        Self { start, end }
    }

    pub fn single(line: usize) -> Self {
        Self::new(line, line)
    }

    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn hull(&self, other: &LineRange) -> LineRange {
        LineRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Inclusive span width in lines; never zero.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerOrigin {
    Static,
    Ai,
}

impl fmt::Display for AnalyzerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

/// One reported issue from a single analyzer, before merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Id of the rule or scanner that produced this finding.
    pub rule_id: String,

    /// Repo-relative path of the affected file.
    pub file: String,

    pub range: LineRange,

    pub category: Category,

    pub severity: Severity,

    pub title: String,

    pub message: String,

    pub origin: AnalyzerOrigin,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Present for ai-origin findings; static findings are implicit-max.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        file: impl Into<String>,
        range: LineRange,
        category: Category,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            file: file.into(),
            range,
            category,
            severity,
            title: title.into(),
            message: message.into(),
            origin: AnalyzerOrigin::Static,
            suggestion: None,
            confidence: None,
        }
    }

    pub fn with_origin(mut self, origin: AnalyzerOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

/// The deduplicated, final issue entry in a report. One or more constituent
/// findings collapsed into a single record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedIssue {
    pub file: String,

    pub range: LineRange,

    pub category: Category,

    pub severity: Severity,

    pub title: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    pub static_origin: bool,

    pub ai_origin: bool,

    /// How many raw findings were collapsed into this entry.
    pub merged_count: usize,

    /// Ids of the rules/scanners that contributed.
    pub sources: Vec<String>,
}
