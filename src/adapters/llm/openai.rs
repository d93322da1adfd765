//! OpenAI-compatible chat-completions extractor
//!
//! Structured output is requested through tool calling: the output schema is
//! offered as the only tool and `tool_choice` forces the model to call it. The
//! tool-call arguments are the extracted value. Models that answer in plain
//! content instead are accepted when the content is a JSON object, optionally
//! wrapped in a fenced block.

use super::traits::{ExtractionRequest, StructuredExtractor};
use crate::config::{LlmConfig, RetryConfig, SecretString};
use crate::domain::{CasewiseError, ExtractionError, Result};
use crate::log_retry_attempt;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Extraction client for any OpenAI-compatible `/chat/completions` endpoint
///
/// # Example
///
/// ```no_run
/// use casewise::adapters::llm::OpenAiExtractor;
/// use casewise::config::load_config;
///
/// # fn example() -> casewise::domain::Result<()> {
/// let config = load_config("casewise.toml")?;
/// let extractor = OpenAiExtractor::new(&config.llm)?;
/// # Ok(())
/// # }
/// ```
pub struct OpenAiExtractor {
    client: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
    temperature: f32,
    retry: RetryConfig,
}

impl OpenAiExtractor {
    /// Builds the HTTP client from configuration
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                CasewiseError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            retry: config.retry.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, request: &ExtractionRequest) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": request.messages,
            "tools": [{
                "type": "function",
                "function": {
                    "name": request.schema_name,
                    "description": request.description,
                    "parameters": request.schema,
                }
            }],
            "tool_choice": {
                "type": "function",
                "function": {"name": request.schema_name}
            }
        })
    }

    async fn send_once(&self, body: &Value) -> std::result::Result<Value, ExtractionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret().as_ref())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout(e.to_string())
                } else {
                    ExtractionError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ExtractionError::MissingOutput(format!("Unreadable response: {e}")))?;

        structured_output(completion)
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, T, Fut>(&self, operation: F) -> std::result::Result<T, ExtractionError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, ExtractionError>>,
    {
        let max_attempts = self.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts || !e.is_retryable() {
                        return Err(e);
                    }

                    log_retry_attempt!(attempt, max_attempts, e);
                    tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                }
            }
        }
    }
}

#[async_trait]
impl StructuredExtractor for OpenAiExtractor {
    async fn predict(
        &self,
        request: ExtractionRequest,
    ) -> std::result::Result<Value, ExtractionError> {
        let body = self.request_body(&request);

        tracing::debug!(
            schema = %request.schema_name,
            model = %self.model,
            "Requesting structured extraction"
        );

        self.retry_request(|| self.send_once(&body)).await
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

fn structured_output(completion: ChatCompletion) -> std::result::Result<Value, ExtractionError> {
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ExtractionError::MissingOutput("Response has no choices".to_string()))?;

    if let Some(call) = message.tool_calls.first() {
        return serde_json::from_str(&call.function.arguments).map_err(|e| {
            ExtractionError::MissingOutput(format!("Tool call arguments are not JSON: {e}"))
        });
    }

    match message.content.as_deref() {
        Some(content) => parse_content_json(content),
        None => Err(ExtractionError::MissingOutput(
            "Response has neither tool calls nor content".to_string(),
        )),
    }
}

/// Parses plain content as JSON, accepting a ```json fenced block
fn parse_content_json(content: &str) -> std::result::Result<Value, ExtractionError> {
    let body = match content.find("```json") {
        Some(start) => {
            let inner = &content[start + 7..];
            let end = inner.find("```").ok_or_else(|| {
                ExtractionError::MissingOutput("Unclosed JSON block".to_string())
            })?;
            &inner[..end]
        }
        None => content,
    };

    match serde_json::from_str::<Value>(body.trim()) {
        Ok(value) if value.is_object() => Ok(value),
        _ => Err(ExtractionError::MissingOutput(
            "Content is not a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::traits::ChatMessage;
    use crate::config::secret_string;

    fn config(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            model: "test-model".to_string(),
            api_key: secret_string("gsk-test".to_string()),
            temperature: 0.0,
            timeout_seconds: 5,
            retry: RetryConfig {
                max_retries: 3,
                initial_delay_ms: 1,
                max_delay_ms: 5,
                backoff_multiplier: 2.0,
            },
        }
    }

    fn request() -> ExtractionRequest {
        ExtractionRequest {
            schema_name: "GuidelineQueries".to_string(),
            description: "queries".to_string(),
            schema: json!({"type": "object"}),
            messages: vec![ChatMessage::user("find guidelines")],
        }
    }

    fn tool_call_body(arguments: &str) -> String {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "GuidelineQueries", "arguments": arguments}
                    }]
                }
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_predict_reads_tool_call_arguments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer gsk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(tool_call_body(r#"{"queries": ["a", "b", "c"]}"#))
            .create_async()
            .await;

        let extractor = OpenAiExtractor::new(&config(server.url())).unwrap();
        let value = extractor.predict(request()).await.unwrap();

        assert_eq!(value["queries"][2], "c");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_predict_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .expect(3)
            .create_async()
            .await;

        let extractor = OpenAiExtractor::new(&config(server.url())).unwrap();
        let err = extractor.predict(request()).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Service { status: 503, .. }));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_predict_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .expect(1)
            .create_async()
            .await;

        let extractor = OpenAiExtractor::new(&config(server.url())).unwrap();
        let err = extractor.predict(request()).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Service { status: 401, .. }));
        mock.assert_async().await;
    }

    #[test]
    fn test_content_fallback_with_fence() {
        let value = parse_content_json("Here you go:\n```json\n{\"queries\": []}\n```").unwrap();
        assert!(value["queries"].is_array());
    }

    #[test]
    fn test_content_fallback_rejects_prose() {
        assert!(parse_content_json("I cannot help with that.").is_err());
    }

    #[test]
    fn test_empty_choices_is_missing_output() {
        let err = structured_output(ChatCompletion { choices: vec![] }).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingOutput(_)));
    }
}
