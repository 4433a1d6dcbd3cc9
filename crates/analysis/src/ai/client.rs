//! The AI analysis client: wraps any `AiProvider` with the run-level policy
//! the orchestrator relies on. Budget, per-call timeout, bounded retry with
//! backoff, excerpt capping, and schema validation all live here, so the
//! pipeline only ever sees findings or a recorded skip, never a transport
//! error.

use crate::ai::prompts::{build_review_prompt, PromptBuilder};
use crate::ai::provider::{AiError, AiProvider, AiRequest};
use crate::ai::schemas::ReviewResponse;
use crate::core::{AiConfig, Finding};
use crate::selector::SourceFile;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Why a file got no AI verdict. Every variant is file-scoped degradation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiSkip {
    /// The global call budget was exhausted before this file.
    Budget,
    /// Terminal failure, or transient failures beyond the retry bound.
    Failed(String),
    /// The per-call timeout elapsed on the final attempt.
    Timeout,
}

impl fmt::Display for AiSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Budget => write!(f, "call budget exhausted"),
            Self::Failed(reason) => write!(f, "{}", reason),
            Self::Timeout => write!(f, "call timed out"),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct FileReview {
    pub findings: Vec<Finding>,
    /// Issues the model reported that failed schema validation.
    pub warnings: Vec<String>,
}

pub struct AiClient {
    provider: Arc<dyn AiProvider>,
    config: AiConfig,
    prompts: PromptBuilder,
    calls_used: AtomicU32,
}

impl AiClient {
    pub const SCANNER_ID: &'static str = "ai-review";

    pub fn new(provider: Arc<dyn AiProvider>, config: AiConfig) -> Self {
        Self {
            provider,
            config,
            prompts: PromptBuilder::new(),
            calls_used: AtomicU32::new(0),
        }
    }

    pub fn calls_used(&self) -> u32 {
        self.calls_used.load(Ordering::SeqCst)
    }

    /// Reserve one provider call against the global budget.
    fn reserve_call(&self) -> bool {
        self.calls_used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                if used < self.config.call_budget {
                    Some(used + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Cut the excerpt at a line boundary under the byte ceiling.
    fn excerpt<'a>(&self, content: &'a str) -> (&'a str, bool) {
        if content.len() <= self.config.max_excerpt_bytes {
            return (content, false);
        }
        let cut = content[..self.config.max_excerpt_bytes]
            .rfind('\n')
            .unwrap_or(0);
        (&content[..cut], true)
    }

    fn backoff_delay(error: &AiError, attempt: u32) -> Duration {
        match error {
            AiError::RateLimited => Duration::from_secs(2u64.saturating_pow(attempt).min(30)),
            _ => Duration::from_millis(100 * 2u64.saturating_pow(attempt)),
        }
    }

    /// Review one file. Transient failures retry with backoff up to the
    /// configured bound; terminal failures and exhausted budgets surface as a
    /// skip, after which static-only findings stand for the file.
    pub async fn review_file(&self, file: &SourceFile) -> Result<FileReview, AiSkip> {
        let (excerpt, truncated) = self.excerpt(&file.content);
        let (system_prompt, user_prompt) = build_review_prompt(
            &self.prompts,
            file.language.name(),
            &file.path,
            excerpt,
            truncated,
        )
        .map_err(|e| AiSkip::Failed(e.to_string()))?;

        let request = AiRequest {
            system_prompt,
            user_prompt,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let timeout = Duration::from_secs(self.config.call_timeout_secs);
        let mut attempt: u32 = 0;

        let response = loop {
            if !self.reserve_call() {
                debug!(path = %file.path, "AI call budget exhausted");
                return Err(AiSkip::Budget);
            }

            let result =
                match tokio::time::timeout(timeout, self.provider.analyze(request.clone())).await {
                    Ok(result) => result,
                    Err(_) => Err(AiError::Timeout(timeout)),
                };

            match result {
                Ok(response) => break response,
                Err(error) if error.is_transient() && attempt < self.config.max_retries => {
                    let delay = Self::backoff_delay(&error, attempt);
                    warn!(
                        path = %file.path,
                        attempt,
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        "transient AI failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(AiError::Timeout(_)) => return Err(AiSkip::Timeout),
                Err(error) => return Err(AiSkip::Failed(error.to_string())),
            }
        };

        self.parse_review(file, &response.content)
    }

    fn parse_review(&self, file: &SourceFile, content: &str) -> Result<FileReview, AiSkip> {
        let parsed: ReviewResponse = match serde_json::from_str(content) {
            Ok(parsed) => parsed,
            Err(_) => {
                // Some models fence or preface the JSON; salvage before
                // declaring the response malformed.
                match ReviewResponse::extract_json(content)
                    .and_then(|json| serde_json::from_str(json).ok())
                {
                    Some(parsed) => parsed,
                    None => {
                        warn!(path = %file.path, "discarding malformed AI response");
                        return Err(AiSkip::Failed("malformed response".to_string()));
                    }
                }
            }
        };

        let line_count = file.content.lines().count();
        let mut review = FileReview::default();

        for issue in parsed.issues {
            match issue.into_finding(Self::SCANNER_ID, &file.path, line_count) {
                Ok(finding) => review.findings.push(finding),
                Err(reason) => {
                    debug!(path = %file.path, reason = %reason, "dropping invalid AI issue");
                    review
                        .warnings
                        .push(format!("{}: dropped AI issue: {}", file.path, reason));
                }
            }
        }

        info!(
            path = %file.path,
            findings = review.findings.len(),
            dropped = review.warnings.len(),
            "AI review complete"
        );

        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::MockProvider;
    use crate::parser::Language;

    fn source_file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            language: Language::Python,
            size: content.len() as u64,
            content: content.to_string(),
        }
    }

    fn client_with(provider: MockProvider, config: AiConfig) -> (AiClient, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        (
            AiClient::new(provider.clone(), config),
            provider,
        )
    }

    #[tokio::test]
    async fn test_successful_review_produces_findings() {
        let (client, _) = client_with(MockProvider::new(), AiConfig::default());
        let file = source_file("danger.py", "value = eval(user_input)\n");

        let review = client.review_file(&file).await.unwrap();
        assert_eq!(review.findings.len(), 1);
        assert_eq!(review.findings[0].rule_id, AiClient::SCANNER_ID);
        assert_eq!(review.findings[0].confidence, Some(0.95));
    }

    #[tokio::test]
    async fn test_budget_enforced_globally() {
        let config = AiConfig {
            call_budget: 1,
            ..Default::default()
        };
        let (client, provider) = client_with(MockProvider::new(), config);

        let first = source_file("a.py", "x = 1\n");
        let second = source_file("b.py", "y = 2\n");

        assert!(client.review_file(&first).await.is_ok());
        assert_eq!(client.review_file(&second).await, Err(AiSkip::Budget));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_terminal_failure_not_retried() {
        let (client, provider) = client_with(MockProvider::failing(), AiConfig::default());
        let file = source_file("a.py", "x = 1\n");

        let skip = client.review_file(&file).await.unwrap_err();
        assert!(matches!(skip, AiSkip::Failed(_)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_then_skipped() {
        let config = AiConfig {
            max_retries: 2,
            ..Default::default()
        };
        let (client, provider) = client_with(MockProvider::flaky(), config);
        let file = source_file("a.py", "x = 1\n");

        let skip = client.review_file(&file).await.unwrap_err();
        assert!(matches!(skip, AiSkip::Failed(_)));
        // Initial attempt plus two retries.
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_malformed_response_becomes_skip() {
        let (client, provider) = client_with(MockProvider::malformed(), AiConfig::default());
        let file = source_file("a.py", "x = 1\n");

        let skip = client.review_file(&file).await.unwrap_err();
        assert_eq!(skip, AiSkip::Failed("malformed response".to_string()));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_excerpt_truncation() {
        let config = AiConfig {
            max_excerpt_bytes: 32,
            ..Default::default()
        };
        let (client, _) = client_with(MockProvider::new(), config.clone());

        let content = "line one\nline two\nline three\nline four\n";
        let (excerpt, truncated) = client.excerpt(content);
        assert!(truncated);
        assert!(excerpt.len() <= config.max_excerpt_bytes);
        assert!(excerpt.ends_with("three") || excerpt.ends_with("two"));
    }
}
