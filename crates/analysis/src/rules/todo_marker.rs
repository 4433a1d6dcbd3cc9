use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::StructuralUnit;
use crate::rules::Rule;
use anyhow::Result;

const MARKERS: [&str; 4] = ["TODO", "FIXME", "XXX", "HACK"];

pub struct TodoMarkerRule;

impl Rule for TodoMarkerRule {
    fn id(&self) -> &'static str {
        "todo-marker"
    }

    fn name(&self) -> &'static str {
        "Leftover Work Marker"
    }

    fn category(&self) -> Category {
        Category::Maintainability
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for (idx, line) in unit.lines().enumerate() {
            let Some(marker) = MARKERS.iter().find(|m| line.contains(*m)) else {
                continue;
            };
            findings.push(Finding::new(
                self.id(),
                unit.path(),
                LineRange::single(idx + 1),
                self.category(),
                self.severity(),
                format!("{} marker", marker),
                format!("Line {} carries a {} marker: {}", idx + 1, marker, line.trim()),
            ));
        }

        Ok(findings)
    }
}
