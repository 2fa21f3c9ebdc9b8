//! Anthropic messages-API client.
//!
//! Maps the coarse reasoning level to the native extended-thinking token
//! budget. JSON output is requested by instruction rather than a native
//! response-format knob, so the client parses the text content itself.

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
use crate::model::{EmbeddedLlmConfig, ReasoningLevel};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<Thinking>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct Thinking {
    #[serde(rename = "type")]
    kind: &'static str,
    budget_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    config: EmbeddedLlmConfig,
}

impl AnthropicProvider {
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

    fn thinking_budget(&self) -> Option<u32> {
        match self.config.reasoning {
            None | Some(ReasoningLevel::None) => None,
            Some(ReasoningLevel::Low) => Some(1024),
            Some(ReasoningLevel::Medium) => Some(4096),
            Some(ReasoningLevel::High) => Some(16384),
        }
    }

    fn build_request(&self, request: &LlmRequest) -> MessageRequest {
        let thinking = self.thinking_budget().map(|budget_tokens| Thinking {
            kind: "enabled",
            budget_tokens,
        });

        let mut prompt = request.prompt.clone();
        if !matches!(request.response_format, LlmResponseFormat::Text) {
            prompt.push_str("\n\nRespond with a single valid JSON object only. No extra text.");
        }

        let tools = request
            .tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect();

        // Extended thinking rejects explicit sampling overrides.
        let temperature = if thinking.is_some() {
            None
        } else {
            Some(request.temperature.unwrap_or(self.config.temperature))
        };

        MessageRequest {
            model: self.config.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            temperature,
            top_p: if thinking.is_some() { None } else { self.config.top_p },
            system: request.system_prompt.clone(),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            tools,
            thinking,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn id(&self) -> &str {
        "anthropic"
    }

    async fn call(&self, request: LlmRequest) -> Result<LlmResponse, EngineError> {
        let body = self.build_request(&request);
        let url = format!("{}/v1/messages", self.base_url);

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::provider("anthropic", format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(EngineError::provider(
                "anthropic",
                format!("API error {status}: {error_text}"),
            ));
        }

        let decoded: MessageResponse = response.json().await.map_err(|e| {
            EngineError::provider("anthropic", format!("response decode error: {e}"))
        })?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let mut raw_text = String::new();
        let mut tool_calls = Vec::new();
        for block in decoded.content {
            match block {
                ContentBlock::Text { text } => {
                    if !raw_text.is_empty() {
                        raw_text.push('\n');
                    }
                    raw_text.push_str(&text);
                }
                ContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCallRequest { id, name, input });
                }
                ContentBlock::Other => {}
            }
        }

        let content = match request.response_format {
            LlmResponseFormat::Text => None,
            _ => Some(extract_json_object(&raw_text)?),
        };

        let (usage, cost) = priced_usage(
            "anthropic",
            &self.config.model,
            decoded.usage.input_tokens,
            decoded.usage.output_tokens,
        );

        tracing::debug!(
            model = %self.config.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cost,
            duration_ms,
            tool_calls = tool_calls.len(),
            "anthropic call complete"
        );

        Ok(LlmResponse {
            content,
            raw_text,
            usage,
            cost,
            provider: "anthropic".to_string(),
            model: self.config.model.clone(),
            tool_calls,
            duration_ms,
        })
    }
}
