//! OpenAI chat-completions client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::EngineError;
use crate::core::llm::{
    extract_json_object, priced_usage, LlmProvider, LlmRequest, LlmResponse, LlmResponseFormat,
    ToolCallRequest,
};
use crate::model::EmbeddedLlmConfig;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat {
    JsonObject,
    JsonSchema { json_schema: JsonSchemaFormat },
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Serialize)]
struct FunctionTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec,
}

#[derive(Debug, Serialize)]
struct FunctionSpec {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<FunctionTool>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<RawToolCall>,
}

#[derive(Debug, Deserialize)]
struct RawToolCall {
    id: String,
    function: RawFunctionCall,
}

#[derive(Debug, Deserialize)]
struct RawFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    config: EmbeddedLlmConfig,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, config: EmbeddedLlmConfig, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        }
    }

    fn build_request(&self, request: &LlmRequest) -> ChatRequest {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        let response_format = match &request.response_format {
            LlmResponseFormat::Text => None,
            LlmResponseFormat::Json => Some(ResponseFormat::JsonObject),
            LlmResponseFormat::JsonSchema { name, schema } => Some(ResponseFormat::JsonSchema {
                json_schema: JsonSchemaFormat {
                    name: name.clone(),
                    schema: schema.clone(),
                    strict: true,
                },
            }),
        };

        let tools = request
            .tools
            .iter()
            .map(|t| FunctionTool {
                kind: "function",
                function: FunctionSpec {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect();

        // The chat-completions surface has no reasoning knob for the models
        // this engine targets; a configured level is silently ignored.
        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: request.temperature.unwrap_or(self.config.temperature),
            top_p: self.config.top_p,
            response_format,
            tools,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn id(&self) -> &str {
        "openai"
    }

    async fn call(&self, request: LlmRequest) -> Result<LlmResponse, EngineError> {
        let body = self.build_request(&request);
        let url = format!("{}/v1/chat/completions", self.base_url);

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::provider("openai", format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(EngineError::provider(
                "openai",
                format!("API error {status}: {error_text}"),
            ));
        }

        let decoded: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::provider("openai", format!("response decode error: {e}")))?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let message = decoded
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| EngineError::provider("openai", "response contained no choices"))?;

        let raw_text = message.content.unwrap_or_default();

        let mut tool_calls = Vec::with_capacity(message.tool_calls.len());
        for call in message.tool_calls {
            let input: Value = serde_json::from_str(&call.function.arguments).map_err(|e| {
                EngineError::InvalidLlmOutput {
                    reason: format!(
                        "tool call '{}' carried unparseable arguments: {e}",
                        call.function.name
                    ),
                }
            })?;
            tool_calls.push(ToolCallRequest {
                id: call.id,
                name: call.function.name,
                input,
            });
        }

        let content = match request.response_format {
            LlmResponseFormat::Text => None,
            _ => Some(extract_json_object(&raw_text)?),
        };

        let (usage, cost) = priced_usage(
            "openai",
            &self.config.model,
            decoded.usage.prompt_tokens,
            decoded.usage.completion_tokens,
        );

        tracing::debug!(
            model = %self.config.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cost,
            duration_ms,
            tool_calls = tool_calls.len(),
            "openai call complete"
        );

        Ok(LlmResponse {
            content,
            raw_text,
            usage,
            cost,
            provider: "openai".to_string(),
            model: self.config.model.clone(),
            tool_calls,
            duration_ms,
        })
    }
}
