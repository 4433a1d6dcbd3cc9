use crate::core::{Category, Finding, Severity};
use crate::parser::StructuralUnit;
use crate::rules::Rule;
use anyhow::Result;

/// Flags functions whose branch count crosses a cyclomatic-style threshold.
pub struct CyclomaticComplexityRule {
    threshold: u32,
    high_threshold: u32,
}

impl CyclomaticComplexityRule {
    pub fn new() -> Self {
        Self {
            threshold: 10,
            high_threshold: 20,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self.high_threshold = threshold * 2;
        self
    }
}

impl Default for CyclomaticComplexityRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for CyclomaticComplexityRule {
    fn id(&self) -> &'static str {
        "complexity"
    }

    fn name(&self) -> &'static str {
        "Cyclomatic Complexity"
    }

    fn description(&self) -> &'static str {
        "Detects functions with too many independent branch paths"
    }

    fn category(&self) -> Category {
        Category::Maintainability
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn needs_structure(&self) -> bool {
        true
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for func in unit.functions() {
            // Branch count + 1 is the classic complexity approximation.
            let complexity = func.branch_count + 1;
            if complexity <= self.threshold {
                continue;
            }

            let severity = if complexity > self.high_threshold {
                Severity::High
            } else {
                Severity::Medium
            };

            findings.push(
                Finding::new(
                    self.id(),
                    unit.path(),
                    func.range,
                    self.category(),
                    severity,
                    format!("Complex function '{}'", func.name),
                    format!(
                        "Function '{}' has an estimated cyclomatic complexity of {} (threshold {})",
                        func.name, complexity, self.threshold
                    ),
                )
                .with_suggestion(
                    "Extract branches into smaller helper functions or simplify the control flow",
                ),
            );
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::engine::tests::python_unit;

    #[test]
    fn test_flags_branchy_function() {
        let branches: String = (0..12)
            .map(|i| format!("    if n == {}:\n        return {}\n", i, i))
            .collect();
        let source = format!("def dispatch(n):\n{}    return -1\n", branches);

        let unit = python_unit("dispatch.py", &source);
        let findings = CyclomaticComplexityRule::new().check(&unit).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert!(findings[0].message.contains("dispatch"));
    }

    #[test]
    fn test_ignores_simple_function() {
        let unit = python_unit("simple.py", "def add(a, b):\n    return a + b\n");
        let findings = CyclomaticComplexityRule::new().check(&unit).unwrap();
        assert!(findings.is_empty());
    }
}
