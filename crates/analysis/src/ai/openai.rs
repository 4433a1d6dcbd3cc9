use crate::ai::provider::{AiError, AiProvider, AiRequest, AiResponse, TokenUsage};
use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, ChatCompletionResponseFormat,
        ChatCompletionResponseFormatType, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?,
        };

        let config = OpenAIConfig::new().with_api_key(api_key);
        Ok(Self {
            client: Client::with_config(config),
            model: model.into(),
        })
    }

    fn classify_error(message: String) -> AiError {
        let lower = message.to_lowercase();
        if lower.contains("rate limit") || lower.contains("429") {
            AiError::RateLimited
        } else if lower.contains("connection")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("dns")
        {
            AiError::Network(message)
        } else {
            AiError::Api(message)
        }
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn analyze(&self, request: AiRequest) -> Result<AiResponse, AiError> {
        debug!(model = %self.model, "sending chat completion request");

        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: request.system_prompt,
                ..Default::default()
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                    request.user_prompt,
                ),
                ..Default::default()
            }),
        ];

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .response_format(ChatCompletionResponseFormat {
                r#type: ChatCompletionResponseFormatType::JsonObject,
            })
            .build()
            .map_err(|e| AiError::Api(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| Self::classify_error(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AiError::InvalidResponse("no content in response".to_string()))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(tokens = usage.total_tokens, "received chat completion");

        Ok(AiResponse {
            content,
            model: response.model,
            usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn max_context_tokens(&self) -> usize {
        match self.model.as_str() {
            "gpt-4o" | "gpt-4o-mini" | "gpt-4-turbo" => 128_000,
            "gpt-4" => 8_192,
            "gpt-3.5-turbo" => 16_385,
            _ => 8_192,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            OpenAiProvider::classify_error("Rate limit reached for gpt-4o".into()),
            AiError::RateLimited
        ));
        assert!(matches!(
            OpenAiProvider::classify_error("connection reset by peer".into()),
            AiError::Network(_)
        ));
        assert!(matches!(
            OpenAiProvider::classify_error("invalid request body".into()),
            AiError::Api(_)
        ));
    }
}
