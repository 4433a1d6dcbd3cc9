use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::StructuralUnit;
use crate::rules::Rule;
use anyhow::Result;

pub struct LongLineRule {
    max_chars: usize,
}

impl LongLineRule {
    pub fn new() -> Self {
        Self { max_chars: 120 }
    }
}

impl Default for LongLineRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for LongLineRule {
    fn id(&self) -> &'static str {
        "long-line"
    }

    fn name(&self) -> &'static str {
        "Long Line"
    }

    fn category(&self) -> Category {
        Category::Style
    }

    fn severity(&self) -> Severity {
        Severity::Low
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for (idx, line) in unit.lines().enumerate() {
            let width = line.chars().count();
            if width <= self.max_chars {
                continue;
            }
            findings.push(
                Finding::new(
                    self.id(),
                    unit.path(),
                    LineRange::single(idx + 1),
                    self.category(),
                    self.severity(),
                    "Long line",
                    format!(
                        "Line {} is {} characters long (limit {})",
                        idx + 1,
                        width,
                        self.max_chars
                    ),
                )
                .with_suggestion("Break the line into multiple lines for readability"),
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
    fn test_flags_overlong_line() {
        let source = format!("short = 1\nlong = \"{}\"\n", "a".repeat(130));
        let unit = python_unit("w.py", &source);
        let findings = LongLineRule::new().check(&unit).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].range, LineRange::single(2));
    }
}
