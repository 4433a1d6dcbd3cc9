use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::{Language, StructuralUnit};
use crate::rules::Rule;
use anyhow::Result;

/// Lexical loop anti-patterns: index-based iteration where direct iteration
/// works, and quadratic string building.
pub struct InefficientLoopRule;

impl Rule for InefficientLoopRule {
    fn id(&self) -> &'static str {
        "inefficient-loop"
    }

    fn name(&self) -> &'static str {
        "Inefficient Loop"
    }

    fn category(&self) -> Category {
        Category::Performance
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        if unit.language() != Language::Python {
            return Ok(Vec::new());
        }

        let mut findings = Vec::new();
        let mut in_loop_indent: Option<usize> = None;

        for (idx, line) in unit.lines().enumerate() {
            let trimmed = line.trim_start();
            let indent = line.len() - trimmed.len();

            if trimmed.starts_with("for ") && line.contains("range(len(") {
                findings.push(
                    Finding::new(
                        self.id(),
                        unit.path(),
                        LineRange::single(idx + 1),
                        self.category(),
                        self.severity(),
                        "Index-based iteration",
                        format!("Line {} iterates with range(len(...))", idx + 1),
                    )
                    .with_suggestion("Use enumerate() or iterate directly over the collection"),
                );
            }

            if trimmed.starts_with("for ") || trimmed.starts_with("while ") {
                in_loop_indent = Some(indent);
                continue;
            }

            if let Some(loop_indent) = in_loop_indent {
                if !trimmed.is_empty() && indent <= loop_indent {
                    in_loop_indent = None;
                } else if trimmed.contains("+=") && trimmed.contains('"')
                    || trimmed.contains("+= '")
                    || trimmed.contains("+= \"")
                {
                    findings.push(
                        Finding::new(
                            self.id(),
                            unit.path(),
                            LineRange::single(idx + 1),
                            self.category(),
                            Severity::Low,
                            "String concatenation in loop",
                            format!("Line {} grows a string inside a loop", idx + 1),
                        )
                        .with_suggestion("Collect parts in a list and join once after the loop"),
                    );
                }
            }
        }

        Ok(findings)
    }
}
