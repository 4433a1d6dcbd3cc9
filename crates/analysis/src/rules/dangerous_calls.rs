use crate::core::{Category, Finding, LineRange, Severity};
use crate::parser::{Language, StructuralUnit};
use crate::rules::Rule;
use anyhow::Result;

struct Sink {
    pattern: &'static str,
    severity: Severity,
    title: &'static str,
    advice: &'static str,
}

fn sinks_for(language: Language) -> &'static [Sink] {
    match language {
        Language::Python => &[
            Sink {
                pattern: "eval(",
                severity: Severity::Critical,
                title: "eval() usage",
                advice: "Avoid eval(); use ast.literal_eval() for simple cases",
            },
            Sink {
                pattern: "exec(",
                severity: Severity::Critical,
                title: "exec() usage",
                advice: "Avoid exec(); restructure so dynamic code execution is unnecessary",
            },
            Sink {
                pattern: "os.system(",
                severity: Severity::High,
                title: "os.system() usage",
                advice: "Use subprocess.run with an argument list instead of a shell string",
            },
            Sink {
                pattern: "shell=True",
                severity: Severity::High,
                title: "subprocess with shell=True",
                advice: "Pass an argument list and drop shell=True to avoid shell injection",
            },
            Sink {
                pattern: "pickle.loads(",
                severity: Severity::High,
                title: "pickle deserialization",
                advice: "Never unpickle untrusted data; prefer json or a schema-validated format",
            },
        ],
        Language::JavaScript | Language::TypeScript => &[
            Sink {
                pattern: "eval(",
                severity: Severity::Critical,
                title: "eval() usage",
                advice: "Avoid eval(); use JSON.parse or explicit dispatch",
            },
            Sink {
                pattern: ".innerHTML",
                severity: Severity::High,
                title: "innerHTML assignment",
                advice: "Use textContent or a sanitizer to avoid DOM-based XSS",
            },
            Sink {
                pattern: "child_process.exec(",
                severity: Severity::High,
                title: "shell command execution",
                advice: "Use execFile with an argument list to avoid shell injection",
            },
            Sink {
                pattern: "new Function(",
                severity: Severity::High,
                title: "dynamic Function constructor",
                advice: "Avoid compiling strings to code at runtime",
            },
        ],
        Language::C | Language::Cpp => &[
            Sink {
                pattern: "gets(",
                severity: Severity::Critical,
                title: "gets() usage",
                advice: "gets() cannot bound its input; use fgets()",
            },
            Sink {
                pattern: "strcpy(",
                severity: Severity::High,
                title: "strcpy() usage",
                advice: "Use strncpy or a bounded copy to avoid buffer overflows",
            },
            Sink {
                pattern: "sprintf(",
                severity: Severity::High,
                title: "sprintf() usage",
                advice: "Use snprintf with an explicit buffer size",
            },
            Sink {
                pattern: "system(",
                severity: Severity::High,
                title: "system() usage",
                advice: "Avoid shelling out with attacker-influenced strings",
            },
        ],
        Language::Java => &[Sink {
            pattern: "Runtime.getRuntime().exec(",
            severity: Severity::High,
            title: "runtime command execution",
            advice: "Use ProcessBuilder with an argument list",
        }],
        Language::Php => &[
            Sink {
                pattern: "eval(",
                severity: Severity::Critical,
                title: "eval() usage",
                advice: "Avoid eval(); restructure the logic",
            },
            Sink {
                pattern: "shell_exec(",
                severity: Severity::High,
                title: "shell execution",
                advice: "Escape arguments with escapeshellarg or avoid shelling out",
            },
        ],
        Language::Go | Language::CSharp | Language::Ruby => &[],
    }
}

/// Sensitive operations detected by lexical pattern match, the unchecked-input
/// counterpart of full data-flow analysis.
pub struct DangerousCallRule;

impl Rule for DangerousCallRule {
    fn id(&self) -> &'static str {
        "dangerous-call"
    }

    fn name(&self) -> &'static str {
        "Dangerous Call"
    }

    fn description(&self) -> &'static str {
        "Detects sensitive operations reachable from unvalidated input"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn check(&self, unit: &StructuralUnit) -> Result<Vec<Finding>> {
        let sinks = sinks_for(unit.language());
        let mut findings = Vec::new();

        for (idx, line) in unit.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }
            for sink in sinks {
                if !line.contains(sink.pattern) {
                    continue;
                }
                findings.push(
                    Finding::new(
                        self.id(),
                        unit.path(),
                        LineRange::single(idx + 1),
                        self.category(),
                        sink.severity,
                        sink.title,
                        format!("Line {} uses {}: {}", idx + 1, sink.title, line.trim()),
                    )
                    .with_suggestion(sink.advice),
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
    fn test_flags_eval_in_python() {
        let source = "value = eval(user_input)\n";
        let unit = python_unit("danger.py", source);
        let findings = DangerousCallRule.check(&unit).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].category, Category::Security);
    }

    #[test]
    fn test_comment_lines_ignored() {
        let source = "# never call eval(x) here\nsafe = parse(x)\n";
        let unit = python_unit("ok.py", source);
        assert!(DangerousCallRule.check(&unit).unwrap().is_empty());
    }

    #[test]
    fn test_shell_true_flagged() {
        let source = "subprocess.run(cmd, shell=True)\n";
        let unit = python_unit("sh.py", source);
        let findings = DangerousCallRule.check(&unit).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
    }
}
