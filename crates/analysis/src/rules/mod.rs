//! Static rule engine.
//!
//! Each detector implements the `Rule` trait: a pure, side-effect-free pass
//! over one structural unit that emits zero or more findings. Rules declare a
//! fixed category and severity, never consult the AI stage, and can run in any
//! order or in parallel. Text rules operate on raw lines and therefore also
//! run on fallback units; structural rules require a parsed outline.

pub mod complexity;
pub mod dangerous_calls;
pub mod docstring;
pub mod duplication;
pub mod engine;
pub mod error_handling;
pub mod inefficient_loop;
pub mod long_line;
pub mod oversized;
pub mod secrets;
pub mod todo_marker;

pub use engine::{FileAnalysis, StaticRuleEngine};

use crate::core::{Category, Finding, Severity};
use crate::parser::StructuralUnit;
use anyhow::Result;
use std::sync::Arc;

pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn category(&self) -> Category;

    fn severity(&self) -> Severity;

    /// Structural rules are skipped for fallback units; text rules run on
    /// every unit.
    fn needs_structure(&self) -> bool {
        false
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>>;
}

/// Explicit rule list built at startup. Registration order is the execution
/// order, which keeps engine output reproducible.
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Arc::new(rule));
    }

    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.register(rule);
        self
    }

    /// The fixed default detector set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(complexity::CyclomaticComplexityRule::new());
        registry.register(oversized::OversizedFunctionRule::new());
        registry.register(oversized::OversizedFileRule::new());
        registry.register(long_line::LongLineRule::new());
        registry.register(todo_marker::TodoMarkerRule);
        registry.register(secrets::HardcodedSecretRule);
        registry.register(dangerous_calls::DangerousCallRule);
        registry.register(error_handling::MissingErrorHandlingRule);
        registry.register(inefficient_loop::InefficientLoopRule);
        registry.register(duplication::DuplicateBlockRule::new());
        registry.register(docstring::MissingDocstringRule);
        registry
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_fixed_rule_set() {
        let registry = RuleRegistry::with_defaults();
        assert_eq!(registry.len(), 11);

        let ids: Vec<_> = registry.rules().iter().map(|r| r.id()).collect();
        assert!(ids.contains(&"complexity"));
        assert!(ids.contains(&"hardcoded-secret"));
        assert!(ids.contains(&"dangerous-call"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = RuleRegistry::new();
        assert!(registry.is_empty());
    }
}
