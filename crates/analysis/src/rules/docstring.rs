use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::{Language, StructuralUnit};
use crate::rules::Rule;
use anyhow::Result;

/// Python functions without a docstring. Other languages document elsewhere,
/// so the rule stays language-gated.
pub struct MissingDocstringRule;

impl Rule for MissingDocstringRule {
    fn id(&self) -> &'static str {
        "missing-docstring"
    }

    fn name(&self) -> &'static str {
        "Missing Docstring"
    }

    fn category(&self) -> Category {
        Category::Maintainability
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn needs_structure(&self) -> bool {
        true
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        if unit.language() != Language::Python {
            return Ok(Vec::new());
        }

        let lines: Vec<&str> = unit.lines().collect();
        let mut findings = Vec::new();

        for func in unit.functions() {
            if func.name.starts_with('_') {
                continue;
            }

            // The docstring, when present, is the first statement after the
            // `def` header, which may itself wrap across lines.
            let has_docstring = lines
                .iter()
                .skip(func.range.start.saturating_sub(1))
                .take(func.range.len().min(4))
                .skip_while(|line| !line.trim_end().ends_with(':'))
                .skip(1)
                .map(|line| line.trim_start())
                .find(|line| !line.is_empty())
                .map(|line| line.starts_with("\"\"\"") || line.starts_with("'''"))
                .unwrap_or(false);

            if !has_docstring {
                findings.push(
                    Finding::new(
                        self.id(),
                        unit.path(),
                        LineRange::single(func.range.start),
                        self.category(),
                        self.severity(),
                        format!("Undocumented function '{}'", func.name),
                        format!("Function '{}' lacks a docstring", func.name),
                    )
                    .with_suggestion(
                        "Add a docstring describing purpose, parameters, and return value",
                    ),
                );
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::engine::tests::python_unit;

    #[test]
    fn test_flags_undocumented_public_function() {
        let unit = python_unit("api.py", "def handler(req):\n    return req\n");
        let findings = MissingDocstringRule.check(&unit).unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("handler"));
    }

    #[test]
    fn test_docstring_satisfies_rule() {
        let source = "def handler(req):\n    \"\"\"Route one request.\"\"\"\n    return req\n";
        let unit = python_unit("api.py", source);
        assert!(MissingDocstringRule.check(&unit).unwrap().is_empty());
    }

    #[test]
    fn test_private_functions_exempt() {
        let unit = python_unit("api.py", "def _helper():\n    return 1\n");
        assert!(MissingDocstringRule.check(&unit).unwrap().is_empty());
    }
}
