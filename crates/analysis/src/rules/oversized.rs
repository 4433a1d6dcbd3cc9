use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::StructuralUnit;
use crate::rules::Rule;
use anyhow::Result;

pub struct OversizedFunctionRule {
    max_lines: usize,
}

impl OversizedFunctionRule {
    pub fn new() -> Self {
        Self { max_lines: 50 }
    }
}

impl Default for OversizedFunctionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for OversizedFunctionRule {
    fn id(&self) -> &'static str {
        "oversized-function"
    }

    fn name(&self) -> &'static str {
        "Oversized Function"
    }

    fn description(&self) -> &'static str {
        "Detects functions long enough to resist review and testing"
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
            let lines = func.range.len();
            if lines <= self.max_lines {
                continue;
            }
            findings.push(
                Finding::new(
                    self.id(),
                    unit.path(),
                    func.range,
                    self.category(),
                    self.severity(),
                    format!("Long function '{}'", func.name),
                    format!(
                        "Function '{}' spans {} lines (limit {})",
                        func.name, lines, self.max_lines
                    ),
                )
                .with_suggestion("Break this function into smaller, more focused functions"),
            );
        }

        Ok(findings)
    }
}

pub struct OversizedFileRule {
    max_lines: usize,
}

impl OversizedFileRule {
    pub fn new() -> Self {
        Self { max_lines: 500 }
    }
}

impl Default for OversizedFileRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for OversizedFileRule {
    fn id(&self) -> &'static str {
        "oversized-file"
    }

    fn name(&self) -> &'static str {
        "Oversized File"
    }

    fn category(&self) -> Category {
        Category::Maintainability
    }

    fn severity(&self) -> Severity {
        Severity::Low
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        let lines = unit.line_count();
        if lines <= self.max_lines {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::new(
            self.id(),
            unit.path(),
            LineRange::new(1, lines),
            self.category(),
            self.severity(),
            "Large file",
            format!("File spans {} lines (limit {})", lines, self.max_lines),
        )
        .with_suggestion("Split this file along its natural module boundaries")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::engine::tests::python_unit;

    #[test]
    fn test_flags_long_function() {
        let body: String = (0..60).map(|i| format!("    x{} = {}\n", i, i)).collect();
        let source = format!("def setup():\n{}", body);

        let unit = python_unit("setup.py", &source);
        let findings = OversizedFunctionRule::new().check(&unit).unwrap();

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("setup"));
    }

    #[test]
    fn test_flags_long_file() {
        let source = "x = 1\n".repeat(501);
        let unit = python_unit("big.py", &source);
        let findings = OversizedFileRule::new().check(&unit).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].range, LineRange::new(1, 501));
    }

    #[test]
    fn test_short_inputs_pass() {
        let unit = python_unit("ok.py", "def f():\n    return 1\n");
        assert!(OversizedFunctionRule::new().check(&unit).unwrap().is_empty());
        assert!(OversizedFileRule::new().check(&unit).unwrap().is_empty());
    }
}
