use crate::ai::schemas::ReviewResponse;
use anyhow::Result;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub system_prompt: String,
    pub user_prompt_template: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: String::new(),
            user_prompt_template: String::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_user_template(mut self, template: impl Into<String>) -> Self {
        self.user_prompt_template = template.into();
        self
    }
}

pub struct PromptBuilder {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            templates: HashMap::new(),
        };
        builder.add_template(Self::code_review_template());
        builder
    }

    pub fn add_template(&mut self, template: PromptTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn build_prompt(
        &self,
        template_name: &str,
        variables: HashMap<String, String>,
    ) -> Result<(String, String)> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| anyhow::anyhow!("template '{}' not found", template_name))?;

        let system_prompt = substitute(&template.system_prompt, &variables);
        let user_prompt = substitute(&template.user_prompt_template, &variables);
        Ok((system_prompt, user_prompt))
    }

    fn code_review_template() -> PromptTemplate {
        PromptTemplate::new("code_review")
            .with_system_prompt(CODE_REVIEW_SYSTEM_PROMPT)
            .with_user_template(CODE_REVIEW_USER_TEMPLATE)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn substitute(template: &str, variables: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in variables {
        result = result.replace(&format!("{{{}}}", key), value);
    }
    result
}

const CODE_REVIEW_SYSTEM_PROMPT: &str = "You are an expert code reviewer. You analyze source code for logic errors, \
security vulnerabilities, performance problems, maintainability concerns, and \
style issues. You report only concrete, actionable problems tied to specific \
lines, never generic advice. You always respond with a single JSON object \
matching the requested schema and nothing else.";

const CODE_REVIEW_USER_TEMPLATE: &str = r#"Analyze the following {language} code for potential issues, bugs, and improvements.
File: {file_path}
{truncation_note}
Code (line numbers are 1-based and match the original file):
```{language}
{code}
```

Identify:
1. Logic errors or potential bugs
2. Security vulnerabilities
3. Performance problems
4. Maintainability concerns
5. Style issues worth fixing

For each issue report the category (security, performance, maintainability,
style, logic), the severity (critical, high, medium, low, info), the affected
line range, a short title, a description of the problem, a suggested fix, and
your confidence from 0.0 to 1.0.

Respond with JSON matching this structure exactly:
{json_schema}

Focus on practical, actionable feedback. Report an empty issues list when the
code is clean."#;

/// Build the standard review prompt for one file excerpt.
pub fn build_review_prompt(
    builder: &PromptBuilder,
    language: &str,
    file_path: &str,
    code: &str,
    truncated: bool,
) -> Result<(String, String)> {
    let mut variables = HashMap::new();
    variables.insert("language".to_string(), language.to_string());
    variables.insert("file_path".to_string(), file_path.to_string());
    variables.insert("code".to_string(), code.to_string());
    variables.insert(
        "json_schema".to_string(),
        ReviewResponse::schema_definition().to_string(),
    );
    variables.insert(
        "truncation_note".to_string(),
        if truncated {
            "Note: the file was truncated to fit the context budget; only the \
lines shown are under review.\n"
                .to_string()
        } else {
            String::new()
        },
    );
    builder.build_prompt("code_review", variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_substitution() {
        let builder = PromptBuilder::new();
        let (system, user) =
            build_review_prompt(&builder, "python", "app/main.py", "print('x')", false).unwrap();

        assert!(system.contains("code reviewer"));
        assert!(user.contains("app/main.py"));
        assert!(user.contains("```python"));
        assert!(user.contains("\"issues\""));
        assert!(!user.contains("{language}"));
    }

    #[test]
    fn test_truncation_note_included() {
        let builder = PromptBuilder::new();
        let (_, user) =
            build_review_prompt(&builder, "python", "big.py", "x = 1", true).unwrap();
        assert!(user.contains("truncated"));
    }

    #[test]
    fn test_unknown_template_errors() {
        let builder = PromptBuilder::new();
        assert!(builder
            .build_prompt("nonexistent", HashMap::new())
            .is_err());
    }
}
