//! In-memory port implementations.
//!
//! The repository backs the CLI and tests; the dry-run gateway echoes what
//! would have been invoked without touching any external system.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ActionGateway, ActionInvocation, ActionResult, ToolRepository};
use crate::model::{AgenticTool, ExecutionRecord};

/// Tool and execution storage held entirely in memory.
#[derive(Default)]
pub struct InMemoryRepository {
    tools: RwLock<Vec<AgenticTool>>,
    executions: RwLock<Vec<ExecutionRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_tool(&self, tool: AgenticTool) {
        self.tools.write().await.push(tool);
    }

    /// Snapshot of persisted execution records, oldest first.
    pub async fn executions(&self) -> Vec<ExecutionRecord> {
        self.executions.read().await.clone()
    }
}

#[async_trait]
impl ToolRepository for InMemoryRepository {
    async fn find_tool(&self, tenant_id: &str, identifier: &str) -> Result<Option<AgenticTool>> {
        let tools = self.tools.read().await;
        let by_id = Uuid::parse_str(identifier).ok();

        Ok(tools
            .iter()
            .find(|t| {
                t.tenant_id == tenant_id
                    && (Some(t.id) == by_id || t.slug == identifier)
            })
            .cloned())
    }

    async fn create_execution_record(&self, record: ExecutionRecord) -> Result<Uuid> {
        let id = record.id;
        self.executions.write().await.push(record);
        Ok(id)
    }
}

/// Gateway that reports success without performing anything, echoing the
/// invocation back as the action's data. Used by the CLI's `invoke` command.
pub struct DryRunGateway;

#[async_trait]
impl ActionGateway for DryRunGateway {
    async fn invoke_action(&self, invocation: ActionInvocation) -> ActionResult {
        tracing::info!(
            integration = %invocation.integration_slug,
            action = %invocation.action_slug,
            "dry-run: action not invoked"
        );
        ActionResult::ok(json!({
            "dry_run": true,
            "integration_slug": invocation.integration_slug,
            "action_slug": invocation.action_slug,
            "parameters": invocation.parameters,
        }))
    }
}

/// Schema loader with nothing to serve. Context variables of type
/// `integration_schema` or `reference_data` render empty under it.
pub struct EmptySchemaLoader;

#[async_trait]
impl super::SchemaLoader for EmptySchemaLoader {
    async fn load_integration_schema(
        &self,
        _tenant_id: &str,
        integration_slug: &str,
    ) -> Result<super::IntegrationSchema> {
        Ok(super::IntegrationSchema {
            integration: integration_slug.to_string(),
            actions: Vec::new(),
        })
    }

    async fn load_reference_data(
        &self,
        _tenant_id: &str,
        _data_type: &str,
    ) -> Result<Vec<super::ReferenceRow>> {
        Ok(Vec::new())
    }
}
