//! External collaborator interfaces.
//!
//! Persistence, the downstream action gateway, schema/reference loaders,
//! and the tracing sink are all consumed through these traits; the engine
//! never talks to a concrete backend directly. The tracing sink's methods
//! deliberately return nothing: sink failures are swallowed inside the
//! implementation and can never change an invocation's outcome.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::{AgenticTool, ExecutionRecord, LlmCallRecord, ToolCallRecord};

pub mod memory;

/// One request to the downstream action-invocation gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInvocation {
    pub tenant_id: String,
    pub integration_slug: String,
    pub action_slug: String,
    pub parameters: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Gateway outcome. Transport failures are folded into `error` by the
/// implementation; the engine only ever sees this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl ActionResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ActionError {
                message: message.into(),
                code: None,
            }),
        }
    }
}

/// One action in an integration's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSchema {
    pub name: String,
    pub description: String,
    pub method: String,
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default)]
    pub output_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationSchema {
    pub integration: String,
    pub actions: Vec<ActionSchema>,
}

/// One active reference-data row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: Value,
}

/// Tool configuration and execution-log persistence.
#[async_trait]
pub trait ToolRepository: Send + Sync {
    /// Resolve a tool by UUID or slug, scoped to the tenant.
    async fn find_tool(&self, tenant_id: &str, identifier: &str) -> Result<Option<AgenticTool>>;

    /// Persist a completed execution record. Returns the record id.
    async fn create_execution_record(&self, record: ExecutionRecord) -> Result<Uuid>;
}

/// The downstream action-invocation gateway. Credential resolution,
/// caching, and retries all live behind this call.
#[async_trait]
pub trait ActionGateway: Send + Sync {
    async fn invoke_action(&self, invocation: ActionInvocation) -> ActionResult;
}

/// Integration schema and reference-data loading for prompt context.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    async fn load_integration_schema(
        &self,
        tenant_id: &str,
        integration_slug: &str,
    ) -> Result<IntegrationSchema>;

    /// Active rows for a data type. Implementations cap at 500 rows.
    async fn load_reference_data(
        &self,
        tenant_id: &str,
        data_type: &str,
    ) -> Result<Vec<ReferenceRow>>;
}

/// Write-only observability sink. Best-effort by contract: no failure
/// channel exists for callers to observe.
#[async_trait]
pub trait TracingSink: Send + Sync {
    async fn log_llm_call(&self, trace_id: &str, record: &LlmCallRecord);

    async fn log_tool_call(&self, trace_id: &str, record: &ToolCallRecord);
}

/// Sink that discards everything. The default when no exporter is wired up.
pub struct NoopTracingSink;

#[async_trait]
impl TracingSink for NoopTracingSink {
    async fn log_llm_call(&self, _trace_id: &str, _record: &LlmCallRecord) {}

    async fn log_tool_call(&self, _trace_id: &str, _record: &ToolCallRecord) {}
}
