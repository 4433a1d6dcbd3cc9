//! Test double for the reasoning service. Canned responses keyed by prompt
//! substring, plus failure and malformed-output modes for degradation tests.

use crate::ai::provider::{AiError, AiProvider, AiRequest, AiResponse, TokenUsage};
use crate::ai::schemas::{ReviewResponse, ReviewedIssue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureMode {
    None,
    /// Every call errors with a terminal API error.
    Terminal,
    /// Every call errors with a transient network error.
    Transient,
    /// Every call succeeds but returns unparseable content.
    Malformed,
}

pub struct MockProvider {
    responses: HashMap<String, ReviewResponse>,
    default_response: ReviewResponse,
    call_count: AtomicUsize,
    failure_mode: FailureMode,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Self::default_responses(),
            default_response: Self::empty_response(),
            call_count: AtomicUsize::new(0),
            failure_mode: FailureMode::None,
        }
    }

    pub fn failing() -> Self {
        let mut provider = Self::new();
        provider.failure_mode = FailureMode::Terminal;
        provider
    }

    pub fn flaky() -> Self {
        let mut provider = Self::new();
        provider.failure_mode = FailureMode::Transient;
        provider
    }

    pub fn malformed() -> Self {
        let mut provider = Self::new();
        provider.failure_mode = FailureMode::Malformed;
        provider
    }

    pub fn with_response(mut self, pattern: &str, response: ReviewResponse) -> Self {
        self.responses.insert(pattern.to_string(), response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn default_responses() -> HashMap<String, ReviewResponse> {
        let mut responses = HashMap::new();

        responses.insert(
            "eval".to_string(),
            ReviewResponse {
                issues: vec![ReviewedIssue {
                    category: "security".to_string(),
                    severity: "critical".to_string(),
                    title: "Arbitrary code execution via eval".to_string(),
                    description: "User-controlled input reaches eval()".to_string(),
                    line_start: Some(1),
                    line_end: Some(1),
                    suggestion: Some("Replace eval with ast.literal_eval".to_string()),
                    confidence: Some(0.95),
                }],
                summary: "One critical security issue".to_string(),
            },
        );

        responses.insert(
            "divide".to_string(),
            ReviewResponse {
                issues: vec![ReviewedIssue {
                    category: "logic".to_string(),
                    severity: "high".to_string(),
                    title: "Possible division by zero".to_string(),
                    description: "Divisor is not checked before use".to_string(),
                    line_start: Some(2),
                    line_end: None,
                    suggestion: Some("Guard against a zero divisor".to_string()),
                    confidence: Some(0.7),
                }],
                summary: "One logic issue".to_string(),
            },
        );

        responses
    }

    fn empty_response() -> ReviewResponse {
        ReviewResponse {
            issues: vec![],
            summary: "No issues detected".to_string(),
        }
    }

    fn pick_response(&self, request: &AiRequest) -> ReviewResponse {
        let combined = format!("{} {}", request.system_prompt, request.user_prompt);
        for (pattern, response) in &self.responses {
            if combined.contains(pattern.as_str()) {
                return response.clone();
            }
        }
        self.default_response.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    async fn analyze(&self, request: AiRequest) -> Result<AiResponse, AiError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match self.failure_mode {
            FailureMode::Terminal => {
                return Err(AiError::Api("mock provider configured to fail".to_string()))
            }
            FailureMode::Transient => {
                return Err(AiError::Network("mock connection reset".to_string()))
            }
            FailureMode::Malformed => {
                return Ok(AiResponse {
                    content: "I found several problems but forgot the JSON.".to_string(),
                    model: "mock-model".to_string(),
                    usage: TokenUsage::default(),
                })
            }
            FailureMode::None => {}
        }

        let response = self.pick_response(&request);
        let content = serde_json::to_string(&response)
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        Ok(AiResponse {
            content,
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 200,
                total_tokens: 300,
            },
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn max_context_tokens(&self) -> usize {
        100_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(user: &str) -> AiRequest {
        AiRequest {
            system_prompt: "review".to_string(),
            user_prompt: user.to_string(),
            temperature: 0.2,
            max_tokens: 1000,
        }
    }

    #[tokio::test]
    async fn test_pattern_matched_response() {
        let provider = MockProvider::new();
        let response = provider.analyze(request("value = eval(x)")).await.unwrap();
        let parsed: ReviewResponse = serde_json::from_str(&response.content).unwrap();
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].severity, "critical");
    }

    #[tokio::test]
    async fn test_call_counting() {
        let provider = MockProvider::new();
        assert_eq!(provider.call_count(), 0);
        provider.analyze(request("x")).await.unwrap();
        provider.analyze(request("y")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let provider = MockProvider::failing();
        let err = provider.analyze(request("x")).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_flaky_mode_is_transient() {
        let provider = MockProvider::flaky();
        let err = provider.analyze(request("x")).await.unwrap_err();
        assert!(err.is_transient());
    }
}
