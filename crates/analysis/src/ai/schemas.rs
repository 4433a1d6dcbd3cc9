//! Wire schema for the reasoning service's structured response, and its
//! validation into core findings. Anything that does not fit this shape is
//! discarded per issue or per response, never propagated as a crash.

use crate::core::{AnalyzerOrigin, Category, Finding, LineRange, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    #[serde(default)]
    pub issues: Vec<ReviewedIssue>,

    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewedIssue {
    #[serde(alias = "type")]
    pub category: String,

    pub severity: String,

    pub title: String,

    pub description: String,

    #[serde(default, alias = "line")]
    pub line_start: Option<u32>,

    #[serde(default)]
    pub line_end: Option<u32>,

    #[serde(default)]
    pub suggestion: Option<String>,

    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ReviewedIssue {
    /// Validate one reported issue into a finding. Returns the reason for
    /// rejection when a required field is missing or unparseable.
    pub fn into_finding(
        self,
        scanner_id: &str,
        file: &str,
        file_line_count: usize,
    ) -> Result<Finding, String> {
        let category: Category = self
            .category
            .parse()
            .map_err(|e| format!("issue '{}': {}", self.title, e))?;
        let severity: Severity = self
            .severity
            .parse()
            .map_err(|e| format!("issue '{}': {}", self.title, e))?;

        if self.title.trim().is_empty() {
            return Err("issue missing title".to_string());
        }
        if self.description.trim().is_empty() {
            return Err(format!("issue '{}' missing description", self.title));
        }

        let start = self
            .line_start
            .ok_or_else(|| format!("issue '{}' missing line number", self.title))?
            as usize;
        let end = self.line_end.map(|l| l as usize).unwrap_or(start);
        if start == 0 {
            return Err(format!("issue '{}' has line 0", self.title));
        }

        // Clamp hallucinated coordinates into the file rather than dropping
        // the whole issue.
        let max = file_line_count.max(1);
        let range = LineRange::new(start.min(max), end.min(max));

        let mut finding = Finding::new(
            scanner_id,
            file,
            range,
            category,
            severity,
            self.title,
            self.description,
        )
        .with_origin(AnalyzerOrigin::Ai)
        .with_confidence(self.confidence.unwrap_or(0.5));

        if let Some(suggestion) = self.suggestion {
            if !suggestion.trim().is_empty() {
                finding = finding.with_suggestion(suggestion);
            }
        }

        Ok(finding)
    }
}

impl ReviewResponse {
    /// The JSON contract embedded in every prompt.
    pub fn schema_definition() -> &'static str {
        r#"
{
  "issues": [
    {
      "category": "security|performance|maintainability|style|logic",
      "severity": "critical|high|medium|low|info",
      "title": "string (brief title)",
      "description": "string (what is wrong and why it matters)",
      "line_start": "number (1-based)",
      "line_end": "number (optional, defaults to line_start)",
      "suggestion": "string (optional, how to fix)",
      "confidence": "number (0.0-1.0)"
    }
  ],
  "summary": "string (overall assessment)"
}
"#
    }

    /// Pull the first JSON object out of a possibly fenced or chatty reply.
    pub fn extract_json(text: &str) -> Option<&str> {
        let start = text.find('{')?;
        let bytes = text.as_bytes();
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, &byte) in bytes[start..].iter().enumerate() {
            if escape_next {
                escape_next = false;
                continue;
            }
            match byte {
                b'\\' if in_string => escape_next = true,
                b'"' => in_string = !in_string,
                b'{' if !in_string => depth += 1,
                b'}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..start + i + 1]);
                    }
                }
                _ => {}
            }
        }
        None
    }
}
