//! Provider-agnostic LLM call contract.
//!
//! Every backing provider implements the same `call(request) -> response`
//! shape; nothing outside the factory branches on provider identity. The
//! factory keeps an explicit, clearable per-process cache instead of a
//! module-level singleton, and accepts registered instances so tests can
//! inject stubs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::core::cost;
use crate::core::error::EngineError;
use crate::core::providers::{AnthropicProvider, OpenAiProvider};
use crate::model::EmbeddedLlmConfig;

/// Requested shape of the generated content.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponseFormat {
    Text,
    Json,
    /// JSON constrained by a schema, for providers with structured decoding.
    JsonSchema { name: String, schema: Value },
}

/// A callable tool presented to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A tool call the model chose to make.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub response_format: LlmResponseFormat,
    pub tools: Vec<ToolSpec>,
}

impl LlmRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            response_format: LlmResponseFormat::Text,
            tools: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Parsed content when JSON output was requested; `None` for plain text.
    pub content: Option<Value>,
    pub raw_text: String,
    pub usage: TokenUsage,
    pub cost: f64,
    pub provider: String,
    pub model: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub duration_ms: u64,
}

/// Uniform call contract implemented once per backing provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn call(&self, request: LlmRequest) -> Result<LlmResponse, EngineError>;
}

impl std::fmt::Debug for dyn LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LlmProvider({})", self.id())
    }
}

/// Pull a JSON object out of model output. Accepts pure JSON, fenced code
/// blocks, and JSON embedded in prose; anything else is an
/// `INVALID_LLM_OUTPUT` failure.
pub fn extract_json_object(raw: &str) -> Result<Value, EngineError> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Ok(value);
        }
    }

    // Models often wrap JSON in markdown fences or lead-in text; take the
    // outermost brace pair.
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                if value.is_object() {
                    return Ok(value);
                }
            }
        }
    }

    Err(EngineError::InvalidLlmOutput {
        reason: format!(
            "expected a JSON object, got: {}",
            truncate_for_log(trimmed, 200)
        ),
    })
}

fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i < max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &s[..cut])
    }
}

/// Compute and attach the cost for a priced call. Kept here so every
/// provider charges through the same table.
pub fn priced_usage(provider: &str, model: &str, input_tokens: u32, output_tokens: u32) -> (TokenUsage, f64) {
    let usage = TokenUsage {
        input_tokens,
        output_tokens,
        total_tokens: input_tokens + output_tokens,
    };
    let cost = cost::calculate_cost(provider, model, input_tokens, output_tokens);
    (usage, cost)
}

/// Creates and caches provider clients keyed by `provider:model`.
///
/// Registered instances take precedence over constructed ones, which is how
/// tests (and embedders with custom backends) plug in their own providers.
pub struct ProviderFactory {
    settings: Settings,
    cache: Mutex<HashMap<String, Arc<dyn LlmProvider>>>,
}

impl ProviderFactory {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(config: &EmbeddedLlmConfig) -> String {
        format!("{}:{}", config.provider.to_lowercase(), config.model)
    }

    /// Register a provider instance for a provider name. Subsequent `get`
    /// calls for that provider return this instance regardless of model.
    pub fn register(&self, provider: impl Into<String>, instance: Arc<dyn LlmProvider>) {
        let key = provider.into().to_lowercase();
        self.cache
            .lock()
            .expect("provider cache poisoned")
            .insert(key, instance);
    }

    pub fn get(&self, config: &EmbeddedLlmConfig) -> Result<Arc<dyn LlmProvider>, EngineError> {
        let mut cache = self.cache.lock().expect("provider cache poisoned");

        // Registered-by-name entries win (test stubs, custom backends).
        if let Some(registered) = cache.get(&config.provider.to_lowercase()) {
            return Ok(Arc::clone(registered));
        }

        let key = Self::cache_key(config);
        if let Some(cached) = cache.get(&key) {
            return Ok(Arc::clone(cached));
        }

        let instance = self.build(config)?;
        cache.insert(key, Arc::clone(&instance));
        Ok(instance)
    }

    /// Drop every cached instance. Test isolation hook.
    pub fn clear(&self) {
        self.cache.lock().expect("provider cache poisoned").clear();
    }

    fn build(&self, config: &EmbeddedLlmConfig) -> Result<Arc<dyn LlmProvider>, EngineError> {
        let timeout = self.settings.http.timeout_secs;
        match config.provider.to_lowercase().as_str() {
            "openai" => {
                let endpoint = &self.settings.providers.openai;
                let api_key = Settings::resolve_api_key(endpoint).ok_or_else(|| {
                    EngineError::provider("openai", "API key is not configured")
                })?;
                Ok(Arc::new(OpenAiProvider::new(
                    api_key,
                    endpoint.base_url.clone(),
                    config.clone(),
                    timeout,
                )))
            }
            "anthropic" => {
                let endpoint = &self.settings.providers.anthropic;
                let api_key = Settings::resolve_api_key(endpoint).ok_or_else(|| {
                    EngineError::provider("anthropic", "API key is not configured")
                })?;
                Ok(Arc::new(AnthropicProvider::new(
                    api_key,
                    endpoint.base_url.clone(),
                    config.clone(),
                    timeout,
                )))
            }
            other => Err(EngineError::provider(
                other,
                "unsupported provider (expected 'openai' or 'anthropic')",
            )),
        }
    }
}
