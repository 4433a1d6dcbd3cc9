use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::{Language, StructuralUnit};
use crate::rules::Rule;
use anyhow::Result;

/// Swallowed or over-broad error handling around fallible calls.
pub struct MissingErrorHandlingRule;

impl MissingErrorHandlingRule {
    fn check_python(unit: &StructuralUnit, findings: &mut Vec<Finding>, rule_id: &str) {
        let lines: Vec<&str> = unit.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            let trimmed = line.trim();

            if trimmed == "except:" {
                findings.push(
                    Finding::new(
                        rule_id,
                        unit.path(),
                        LineRange::single(idx + 1),
                        Category::Logic,
                        Severity::Medium,
                        "Bare except clause",
                        "A bare `except:` catches every exception, including KeyboardInterrupt",
                    )
                    .with_suggestion("Catch the specific exception type, or at least `Exception`"),
                );
            }

            // `except ...: pass` silently drops the failure.
            if trimmed.starts_with("except") && trimmed.ends_with(':') {
                let swallowed = lines
                    .get(idx + 1)
                    .map(|next| next.trim() == "pass")
                    .unwrap_or(false);
                if swallowed {
                    findings.push(
                        Finding::new(
                            rule_id,
                            unit.path(),
                            LineRange::new(idx + 1, idx + 2),
                            Category::Logic,
                            Severity::Medium,
                            "Swallowed exception",
                            "Exception handler does nothing; the failure is silently discarded",
                        )
                        .with_suggestion("Log the failure or re-raise after cleanup"),
                    );
                }
            }
        }
    }

    fn check_braces(unit: &StructuralUnit, findings: &mut Vec<Finding>, rule_id: &str) {
        let lines: Vec<&str> = unit.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
            let empty_inline = (compact.contains("catch(") && compact.ends_with("{}"))
                || compact.ends_with("catch{}");
            let opens_catch = compact.ends_with("catch{")
                || (compact.contains("catch(") && compact.ends_with('{'));
            let empty_block = opens_catch
                && lines
                    .get(idx + 1)
                    .map(|next| next.trim() == "}")
                    .unwrap_or(false);

            if empty_inline || empty_block {
                findings.push(
                    Finding::new(
                        rule_id,
                        unit.path(),
                        LineRange::single(idx + 1),
                        Category::Logic,
                        Severity::Medium,
                        "Empty catch block",
                        "Catch block discards the error without handling it",
                    )
                    .with_suggestion("Handle the error, log it, or rethrow"),
                );
            }
        }
    }
}

impl Rule for MissingErrorHandlingRule {
    fn id(&self) -> &'static str {
        "missing-error-handling"
    }

    fn name(&self) -> &'static str {
        "Missing Error Handling"
    }

    fn category(&self) -> Category {
        Category::Logic
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        match unit.language() {
            Language::Python => Self::check_python(unit, &mut findings, self.id()),
            Language::JavaScript
            | Language::TypeScript
            | Language::Java
            | Language::CSharp
            | Language::Cpp => Self::check_braces(unit, &mut findings, self.id()),
            _ => {}
        }
        Ok(findings)
    }
}
