use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::StructuralUnit;
use crate::rules::Rule;
use anyhow::Result;

const SECRET_KEYWORDS: [&str; 6] = ["password", "passwd", "api_key", "apikey", "secret", "token"];

/// Lexical match for credential-looking assignments with a string literal on
/// the right-hand side. Deliberately conservative: a keyword alone is not
/// enough, the line must also assign a quoted value.
pub struct HardcodedSecretRule;

impl HardcodedSecretRule {
    fn looks_like_secret(line: &str) -> bool {
        let lower = line.to_lowercase();
        if !SECRET_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return false;
        }
        if !line.contains('=') && !line.contains(':') {
            return false;
        }
        let Some(assign_pos) = line.find(['=', ':']) else {
            return false;
        };
        let rhs = &line[assign_pos + 1..];
        // A quoted, non-empty value that is not obviously a placeholder.
        let quoted = rhs
            .trim()
            .trim_start_matches(['"', '\''])
            .trim_end_matches([';', ',', ')', '"', '\''])
            .trim();
        (rhs.contains('"') || rhs.contains('\''))
            && quoted.len() >= 4
            && !quoted.eq_ignore_ascii_case("changeme")
            && !quoted.starts_with("${")
            && !quoted.starts_with("<")
    }
}

impl Rule for HardcodedSecretRule {
    fn id(&self) -> &'static str {
        "hardcoded-secret"
    }

    fn name(&self) -> &'static str {
        "Hardcoded Secret"
    }

    fn description(&self) -> &'static str {
        "Detects credential keywords assigned string literals"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for (idx, line) in unit.lines().enumerate() {
            if !Self::looks_like_secret(line) {
                continue;
            }
            findings.push(
                Finding::new(
                    self.id(),
                    unit.path(),
                    LineRange::single(idx + 1),
                    self.category(),
                    self.severity(),
                    "Potential hardcoded secret",
                    format!("Line {} appears to assign a credential to a literal", idx + 1),
                )
                .with_suggestion(
                    "Load secrets from environment variables or a secret manager instead",
                ),
            );
        }

        Ok(findings)
    }
}
