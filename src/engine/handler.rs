//! Invocation entry point.
//!
//! `InvocationHandler` owns the resolve-gate-dispatch-persist lifecycle of
//! one tool invocation. It never returns `Err`: every failure, including
//! repository faults, is folded into an `InvocationResult` with a normalized
//! error envelope. The execution record is finalized exactly once per
//! invocation, whether the orchestrator succeeded or not.
//!
//! Information Hiding: which orchestrator ran, and how records were
//! accumulated, is invisible to callers; they see one result shape.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::error::{EngineError, ErrorEnvelope};
use crate::core::llm::ProviderFactory;
use crate::core::safety::SafetyEnforcer;
use crate::engine::OrchestrationReport;
use crate::model::{
    AgenticTool, ExecutionMode, ExecutionRecord, ExecutionStatus, LlmCallRecord, ToolCallRecord,
    ToolStatus,
};
use crate::ports::{ActionGateway, NoopTracingSink, SchemaLoader, ToolRepository, TracingSink};

/// Per-invocation knobs supplied by the caller.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    /// Idempotency key forwarded to the action gateway.
    pub request_id: Option<String>,
    /// Connection to execute downstream actions under.
    pub connection_id: Option<String>,
    /// Persist an execution record on completion.
    pub log_execution: bool,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            request_id: None,
            connection_id: None,
            log_execution: true,
        }
    }
}

/// Everything a caller learns about an invocation beyond its data payload.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvocationMetadata {
    pub tool_id: Option<Uuid>,
    pub tool_slug: Option<String>,
    pub execution_mode: Option<ExecutionMode>,
    pub llm_calls: Vec<LlmCallRecord>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub duration_ms: u64,
    pub execution_id: Option<Uuid>,
    pub trace_id: String,
}

/// Terminal outcome of one invocation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InvocationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    pub metadata: InvocationMetadata,
}

pub struct InvocationHandler {
    repository: Arc<dyn ToolRepository>,
    gateway: Arc<dyn ActionGateway>,
    schemas: Arc<dyn SchemaLoader>,
    tracing_sink: Arc<dyn TracingSink>,
    providers: Arc<ProviderFactory>,
}

impl InvocationHandler {
    pub fn new(
        repository: Arc<dyn ToolRepository>,
        gateway: Arc<dyn ActionGateway>,
        schemas: Arc<dyn SchemaLoader>,
        providers: Arc<ProviderFactory>,
    ) -> Self {
        Self {
            repository,
            gateway,
            schemas,
            tracing_sink: Arc::new(NoopTracingSink),
            providers,
        }
    }

    /// Replace the default no-op tracing sink.
    pub fn with_tracing_sink(mut self, sink: Arc<dyn TracingSink>) -> Self {
        self.tracing_sink = sink;
        self
    }

    pub(crate) fn gateway(&self) -> &dyn ActionGateway {
        self.gateway.as_ref()
    }

    pub(crate) fn schemas(&self) -> &dyn SchemaLoader {
        self.schemas.as_ref()
    }

    pub(crate) fn tracing_sink(&self) -> &dyn TracingSink {
        self.tracing_sink.as_ref()
    }

    pub(crate) fn providers(&self) -> &ProviderFactory {
        self.providers.as_ref()
    }

    /// Invoke a tool by UUID or slug within a tenant.
    ///
    /// Status gates run before any LLM call is made. A disabled or draft
    /// tool costs nothing.
    pub async fn invoke(
        &self,
        identifier: &str,
        tenant_id: &str,
        task: &str,
        options: InvokeOptions,
    ) -> InvocationResult {
        let started = Instant::now();
        let trace_id = format!("tr-{}", Uuid::new_v4().simple());
        let mut metadata = InvocationMetadata {
            tool_id: None,
            tool_slug: None,
            execution_mode: None,
            llm_calls: Vec::new(),
            tool_calls: Vec::new(),
            total_cost: 0.0,
            total_tokens: 0,
            duration_ms: 0,
            execution_id: None,
            trace_id: trace_id.clone(),
        };

        info!("[{}] invoking tool '{}' for tenant '{}'", trace_id, identifier, tenant_id);

        let tool = match self.repository.find_tool(tenant_id, identifier).await {
            Ok(Some(tool)) => tool,
            Ok(None) => {
                return Self::failure(
                    EngineError::ToolNotFound {
                        identifier: identifier.to_string(),
                        tenant_id: tenant_id.to_string(),
                    },
                    metadata,
                    started,
                );
            }
            Err(e) => {
                error!("[{}] tool lookup failed: {:#}", trace_id, e);
                return Self::failure(EngineError::Unknown(e.to_string()), metadata, started);
            }
        };

        metadata.tool_id = Some(tool.id);
        metadata.tool_slug = Some(tool.slug.clone());
        metadata.execution_mode = Some(tool.execution_mode);

        match tool.status {
            ToolStatus::Active => {}
            ToolStatus::Disabled => {
                return Self::failure(
                    EngineError::ToolDisabled { slug: tool.slug },
                    metadata,
                    started,
                );
            }
            ToolStatus::Draft => {
                return Self::failure(
                    EngineError::InvalidStatus {
                        slug: tool.slug.clone(),
                        status: tool.status.to_string(),
                    },
                    metadata,
                    started,
                );
            }
        }

        let enforcer = SafetyEnforcer::new(tool.safety);
        let report = match tool.execution_mode {
            ExecutionMode::ParameterInterpreter => {
                self.run_interpreter(&tool, task, &enforcer, &options, &trace_id).await
            }
            ExecutionMode::AutonomousAgent => {
                self.run_agent(&tool, task, &enforcer, &options, &trace_id).await
            }
        };

        self.finalize(&tool, task, options.log_execution, report, metadata, started, trace_id)
            .await
    }

    /// Fold an orchestrator report into the terminal result, persisting the
    /// execution record when logging is enabled. Persistence failures are
    /// logged and swallowed; an audit miss never changes the outcome.
    #[allow(clippy::too_many_arguments)]
    async fn finalize(
        &self,
        tool: &AgenticTool,
        task: &str,
        log_execution: bool,
        report: OrchestrationReport,
        mut metadata: InvocationMetadata,
        started: Instant,
        trace_id: String,
    ) -> InvocationResult {
        let OrchestrationReport { result, totals } = report;

        metadata.llm_calls = totals.llm_calls;
        metadata.tool_calls = totals.tool_calls;
        metadata.total_cost = totals.total_cost;
        metadata.total_tokens = totals.total_tokens;
        metadata.duration_ms = started.elapsed().as_millis() as u64;

        let status = match &result {
            Ok(_) => ExecutionStatus::Success,
            Err(e) if e.code() == "TIMEOUT" => ExecutionStatus::Timeout,
            Err(_) => ExecutionStatus::Error,
        };

        let envelope = result.as_ref().err().map(EngineError::to_envelope);

        if log_execution {
            let record = ExecutionRecord {
                id: Uuid::new_v4(),
                agentic_tool_id: tool.id,
                tenant_id: tool.tenant_id.clone(),
                input: task.to_string(),
                llm_calls: metadata.llm_calls.clone(),
                tool_calls: metadata.tool_calls.clone(),
                result: result.as_ref().ok().cloned(),
                status,
                error: envelope.clone(),
                total_cost: metadata.total_cost,
                total_tokens: metadata.total_tokens,
                duration_ms: metadata.duration_ms,
                trace_id: trace_id.clone(),
                completed_at: Utc::now(),
            };
            match self.repository.create_execution_record(record).await {
                Ok(id) => metadata.execution_id = Some(id),
                Err(e) => warn!("[{}] failed to persist execution record: {:#}", trace_id, e),
            }
        }

        match result {
            Ok(data) => {
                info!(
                    "[{}] tool '{}' succeeded in {}ms (cost ${:.6})",
                    trace_id, tool.slug, metadata.duration_ms, metadata.total_cost
                );
                InvocationResult {
                    success: true,
                    data: Some(data),
                    error: None,
                    metadata,
                }
            }
            Err(e) => {
                warn!("[{}] tool '{}' failed: {} ({})", trace_id, tool.slug, e, e.code());
                InvocationResult {
                    success: false,
                    data: None,
                    error: envelope,
                    metadata,
                }
            }
        }
    }

    /// Result shape for failures that happen before an orchestrator runs.
    fn failure(
        error: EngineError,
        mut metadata: InvocationMetadata,
        started: Instant,
    ) -> InvocationResult {
        metadata.duration_ms = started.elapsed().as_millis() as u64;
        warn!("[{}] invocation rejected: {} ({})", metadata.trace_id, error, error.code());
        InvocationResult {
            success: false,
            data: None,
            error: Some(error.to_envelope()),
            metadata,
        }
    }
}
