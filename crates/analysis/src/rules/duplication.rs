use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::StructuralUnit;
use crate::rules::Rule;
use anyhow::Result;
use std::collections::HashMap;

/// Repeated runs of identical, non-trivial lines within one file. A windowed
/// hash comparison, not clone detection; good enough to surface copy-paste.
pub struct DuplicateBlockRule {
    window: usize,
}

impl DuplicateBlockRule {
    pub fn new() -> Self {
        Self { window: 6 }
    }

    fn significant(line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.len() > 8
            && !trimmed.starts_with('#')
            && !trimmed.starts_with("//")
            && !trimmed.starts_with('}')
            && trimmed != "else:"
    }
}

impl Default for DuplicateBlockRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DuplicateBlockRule {
    fn id(&self) -> &'static str {
        "duplicate-block"
    }

    fn name(&self) -> &'static str {
        "Duplicated Block"
    }

    fn category(&self) -> Category {
        Category::Maintainability
    }

    fn severity(&self) -> Severity {
        Severity::Low
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        let lines: Vec<String> = unit.lines().map(|l| l.trim().to_string()).collect();
        if lines.len() < self.window * 2 {
            return Ok(Vec::new());
        }

        // First occurrence of each window keyed by its joined text.
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut findings = Vec::new();
        let mut last_reported_end = 0usize;

        for start in 0..=lines.len() - self.window {
            let window = &lines[start..start + self.window];
            if !window.iter().all(|l| Self::significant(l)) {
                continue;
            }
            let key = window.join("\n");

            match seen.get(&key) {
                None => {
                    seen.insert(key, start);
                }
                Some(&first) if start > first + self.window && start + 1 > last_reported_end => {
                    let range = LineRange::new(start + 1, start + self.window);
                    findings.push(
                        Finding::new(
                            self.id(),
                            unit.path(),
                            range,
                            self.category(),
                            self.severity(),
                            "Duplicated block",
                            format!(
                                "Lines {} repeat the block first seen at line {}",
                                range,
                                first + 1
                            ),
                        )
                        .with_suggestion("Extract the repeated block into a shared function"),
                    );
                    last_reported_end = start + self.window;
                }
                Some(_) => {}
            }
        }

        Ok(findings)
    }
}
