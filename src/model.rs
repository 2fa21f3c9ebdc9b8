//! Agentic tool configuration and execution records.
//!
//! An `AgenticTool` is a tenant-owned wrapper around one or more downstream
//! API actions, fronted by a configured LLM. The engine treats tool
//! configuration as read-only; editing happens through configuration APIs
//! outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::core::error::ErrorEnvelope;

/// How the engine turns a natural-language task into action calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One LLM call generates structured parameters for the target actions.
    ParameterInterpreter,
    /// A bounded loop in which the LLM calls tools until it decides it is done.
    AutonomousAgent,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::ParameterInterpreter => write!(f, "parameter_interpreter"),
            ExecutionMode::AutonomousAgent => write!(f, "autonomous_agent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Draft,
    Active,
    Disabled,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Draft => write!(f, "draft"),
            ToolStatus::Active => write!(f, "active"),
            ToolStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Coarse reasoning budget. Providers without a native equivalent ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningLevel {
    None,
    Low,
    Medium,
    High,
}

/// LLM configuration embedded in a tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedLlmConfig {
    pub provider: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4000
}

/// A single downstream action targeted by a parameter-interpreter tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetAction {
    pub integration_slug: String,
    pub action_slug: String,
    /// Declared input schema, JSON-schema shaped (`type`/`properties`/`required`).
    #[serde(default)]
    pub input_schema: Value,
}

/// A tool exposed to the LLM in autonomous-agent mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableTool {
    pub name: String,
    /// Natural-language description used to build the LLM tool menu.
    pub description: String,
    pub integration_slug: String,
    pub action_slug: String,
    #[serde(default)]
    pub input_schema: Value,
}

/// Mode-discriminated allocation of downstream actions to a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ToolAllocation {
    ParameterInterpreter { target_actions: Vec<TargetAction> },
    AutonomousAgent { available_tools: Vec<AvailableTool> },
}

/// Type-discriminated context variable source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextVariable {
    /// Render the named integration's action catalog as Markdown.
    IntegrationSchema { source: String },
    /// Render up to 500 active reference rows of the named data type.
    ReferenceData { source: String },
    /// Use the literal configured value.
    Custom { value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub variables: std::collections::BTreeMap<String, ContextVariable>,
    /// Load schemas for every integration in the allocation, in addition to
    /// explicitly configured variables.
    #[serde(default)]
    pub auto_inject_schemas: bool,
}

/// Hard limits enforced per invocation. All inclusive upper bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafetyLimits {
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_total_cost")]
    pub max_total_cost: f64,
}

fn default_max_tool_calls() -> u32 {
    10
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_max_total_cost() -> f64 {
    1.0
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_tool_calls: default_max_tool_calls(),
            timeout_seconds: default_timeout_seconds(),
            max_total_cost: default_max_total_cost(),
        }
    }
}

/// A configured agentic tool, owned by a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgenticTool {
    pub id: Uuid,
    pub tenant_id: String,
    pub slug: String,
    pub name: String,
    pub execution_mode: ExecutionMode,
    pub llm: EmbeddedLlmConfig,
    /// Template string containing `{{variable}}` placeholders.
    pub system_prompt: String,
    pub allocation: ToolAllocation,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub safety: SafetyLimits,
    pub status: ToolStatus,
}

impl AgenticTool {
    /// Configuration problems a definition carries before it is ever invoked.
    /// Empty means the definition is well-formed.
    pub fn config_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.slug.trim().is_empty() {
            issues.push("slug must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            issues.push(format!(
                "temperature {} outside [0.0, 1.0]",
                self.llm.temperature
            ));
        }
        if !(1000..=8000).contains(&self.llm.max_tokens) {
            issues.push(format!(
                "max_tokens {} outside [1000, 8000]",
                self.llm.max_tokens
            ));
        }
        if !(1..=100).contains(&self.safety.max_tool_calls) {
            issues.push(format!(
                "max_tool_calls {} outside [1, 100]",
                self.safety.max_tool_calls
            ));
        }
        if !(30..=600).contains(&self.safety.timeout_seconds) {
            issues.push(format!(
                "timeout_seconds {} outside [30, 600]",
                self.safety.timeout_seconds
            ));
        }
        if !(0.01..=10.0).contains(&self.safety.max_total_cost) {
            issues.push(format!(
                "max_total_cost {} outside [0.01, 10.0]",
                self.safety.max_total_cost
            ));
        }

        match (&self.execution_mode, &self.allocation) {
            (ExecutionMode::ParameterInterpreter, ToolAllocation::ParameterInterpreter { target_actions }) => {
                if target_actions.is_empty() {
                    issues.push("parameter_interpreter tool has no target actions".to_string());
                }
            }
            (ExecutionMode::AutonomousAgent, ToolAllocation::AutonomousAgent { available_tools }) => {
                if available_tools.is_empty() {
                    issues.push("autonomous_agent tool has no available tools".to_string());
                }
            }
            _ => {
                issues.push(format!(
                    "allocation does not match execution mode '{}'",
                    self.execution_mode
                ));
            }
        }

        issues
    }

    /// Integration slugs referenced by the allocation, deduplicated in order.
    pub fn referenced_integrations(&self) -> Vec<String> {
        let slugs: Vec<&str> = match &self.allocation {
            ToolAllocation::ParameterInterpreter { target_actions } => {
                target_actions.iter().map(|a| a.integration_slug.as_str()).collect()
            }
            ToolAllocation::AutonomousAgent { available_tools } => {
                available_tools.iter().map(|t| t.integration_slug.as_str()).collect()
            }
        };

        let mut seen = std::collections::HashSet::new();
        slugs
            .into_iter()
            .filter(|s| seen.insert(s.to_string()))
            .map(|s| s.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Error,
    Timeout,
}

/// One LLM call made during an invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallRecord {
    pub provider: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost: f64,
    pub duration_ms: u64,
}

/// One downstream action call made during an invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub integration_slug: String,
    pub action_slug: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub success: bool,
}

/// Audit record created once per invocation. Append-only after completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub agentic_tool_id: Uuid,
    pub tenant_id: String,
    /// The raw task text as submitted.
    pub input: String,
    pub llm_calls: Vec<LlmCallRecord>,
    pub tool_calls: Vec<ToolCallRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub duration_ms: u64,
    pub trace_id: String,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tool(mode: ExecutionMode, allocation: ToolAllocation) -> AgenticTool {
        AgenticTool {
            id: Uuid::new_v4(),
            tenant_id: "tenant-1".to_string(),
            slug: "send-message".to_string(),
            name: "Send Message".to_string(),
            execution_mode: mode,
            llm: EmbeddedLlmConfig {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.2,
                max_tokens: 4000,
                reasoning: None,
                top_p: None,
            },
            system_prompt: "You translate tasks into {{slack_schema}} calls.".to_string(),
            allocation,
            context: ContextConfig::default(),
            safety: SafetyLimits::default(),
            status: ToolStatus::Active,
        }
    }

    #[test]
    fn test_allocation_tagged_union_roundtrip() {
        let json = json!({
            "mode": "parameter_interpreter",
            "target_actions": [
                {"integration_slug": "slack", "action_slug": "post_message", "input_schema": {}}
            ]
        });

        let allocation: ToolAllocation = serde_json::from_value(json).unwrap();
        match &allocation {
            ToolAllocation::ParameterInterpreter { target_actions } => {
                assert_eq!(target_actions.len(), 1);
                assert_eq!(target_actions[0].integration_slug, "slack");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_context_variable_tagged_union() {
        let var: ContextVariable =
            serde_json::from_value(json!({"type": "custom", "value": "42"})).unwrap();
        assert!(matches!(var, ContextVariable::Custom { ref value } if value == "42"));

        let var: ContextVariable =
            serde_json::from_value(json!({"type": "integration_schema", "source": "slack"}))
                .unwrap();
        assert!(matches!(var, ContextVariable::IntegrationSchema { ref source } if source == "slack"));
    }

    #[test]
    fn test_safety_limit_defaults() {
        let limits: SafetyLimits = serde_json::from_value(json!({})).unwrap();
        assert_eq!(limits.max_tool_calls, 10);
        assert_eq!(limits.timeout_seconds, 300);
        assert!((limits.max_total_cost - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_issues_detects_mode_mismatch() {
        let tool = sample_tool(
            ExecutionMode::AutonomousAgent,
            ToolAllocation::ParameterInterpreter {
                target_actions: vec![TargetAction {
                    integration_slug: "slack".to_string(),
                    action_slug: "post_message".to_string(),
                    input_schema: json!({}),
                }],
            },
        );

        let issues = tool.config_issues();
        assert!(issues.iter().any(|i| i.contains("does not match")));
    }

    #[test]
    fn test_config_issues_clean_tool() {
        let tool = sample_tool(
            ExecutionMode::ParameterInterpreter,
            ToolAllocation::ParameterInterpreter {
                target_actions: vec![TargetAction {
                    integration_slug: "slack".to_string(),
                    action_slug: "post_message".to_string(),
                    input_schema: json!({}),
                }],
            },
        );

        assert!(tool.config_issues().is_empty());
    }

    #[test]
    fn test_referenced_integrations_deduplicated() {
        let tool = sample_tool(
            ExecutionMode::AutonomousAgent,
            ToolAllocation::AutonomousAgent {
                available_tools: vec![
                    AvailableTool {
                        name: "send".to_string(),
                        description: "Send a message".to_string(),
                        integration_slug: "slack".to_string(),
                        action_slug: "post_message".to_string(),
                        input_schema: json!({}),
                    },
                    AvailableTool {
                        name: "list".to_string(),
                        description: "List channels".to_string(),
                        integration_slug: "slack".to_string(),
                        action_slug: "list_channels".to_string(),
                        input_schema: json!({}),
                    },
                ],
            },
        );

        assert_eq!(tool.referenced_integrations(), vec!["slack".to_string()]);
    }
}
