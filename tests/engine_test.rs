//! End-to-end invocation tests over in-memory ports and a scripted provider.
//!
//! No network and no API keys: the provider factory gets a scripted stub
//! registered under the tool's provider name.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use toolflow::core::llm::{LlmProvider, LlmRequest, LlmResponse, TokenUsage, ToolCallRequest};
use toolflow::model::{
    AgenticTool, AvailableTool, ContextConfig, EmbeddedLlmConfig, ExecutionMode, ExecutionStatus,
    LlmCallRecord, SafetyLimits, TargetAction, ToolAllocation, ToolCallRecord, ToolStatus,
};
use toolflow::ports::memory::{EmptySchemaLoader, InMemoryRepository};
use toolflow::ports::{ActionGateway, ActionInvocation, ActionResult, TracingSink};
use toolflow::{EngineError, InvocationHandler, InvokeOptions, ProviderFactory, Settings};

// --- scripted provider -----------------------------------------------------

struct ScriptedProvider {
    responses: Mutex<VecDeque<LlmResponse>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(responses: Vec<LlmResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn call(&self, request: LlmRequest) -> Result<LlmResponse, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EngineError::provider("scripted", "no scripted response left"))
    }
}

fn base_response() -> LlmResponse {
    LlmResponse {
        content: None,
        raw_text: String::new(),
        usage: TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
            total_tokens: 150,
        },
        cost: 0.0003,
        provider: "scripted".to_string(),
        model: "stub-1".to_string(),
        tool_calls: Vec::new(),
        duration_ms: 5,
    }
}

fn json_response(content: Value) -> LlmResponse {
    LlmResponse {
        raw_text: content.to_string(),
        content: Some(content),
        ..base_response()
    }
}

fn text_response(text: &str) -> LlmResponse {
    LlmResponse {
        raw_text: text.to_string(),
        ..base_response()
    }
}

fn tool_call_response(name: &str, input: Value) -> LlmResponse {
    LlmResponse {
        tool_calls: vec![ToolCallRequest {
            id: format!("call-{}", Uuid::new_v4()),
            name: name.to_string(),
            input,
        }],
        ..base_response()
    }
}

// --- recording gateway -----------------------------------------------------

struct RecordingGateway {
    invocations: Mutex<Vec<ActionInvocation>>,
    /// When set, every invocation fails with this message.
    fail_with: Option<String>,
}

impl RecordingGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            invocations: Mutex::new(Vec::new()),
            fail_with: None,
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            invocations: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        })
    }

    fn recorded(&self) -> Vec<ActionInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionGateway for RecordingGateway {
    async fn invoke_action(&self, invocation: ActionInvocation) -> ActionResult {
        self.invocations.lock().unwrap().push(invocation.clone());
        match &self.fail_with {
            Some(message) => ActionResult::failed(message.clone()),
            None => ActionResult::ok(json!({
                "invoked": format!("{}/{}", invocation.integration_slug, invocation.action_slug),
                "parameters": invocation.parameters,
            })),
        }
    }
}

struct CountingSink {
    llm: AtomicUsize,
    tool: AtomicUsize,
}

#[async_trait]
impl TracingSink for CountingSink {
    async fn log_llm_call(&self, _trace_id: &str, _record: &LlmCallRecord) {
        self.llm.fetch_add(1, Ordering::SeqCst);
    }

    async fn log_tool_call(&self, _trace_id: &str, _record: &ToolCallRecord) {
        self.tool.fetch_add(1, Ordering::SeqCst);
    }
}

// --- fixtures --------------------------------------------------------------

fn llm_config() -> EmbeddedLlmConfig {
    EmbeddedLlmConfig {
        provider: "scripted".to_string(),
        model: "stub-1".to_string(),
        temperature: 0.2,
        max_tokens: 4000,
        reasoning: None,
        top_p: None,
    }
}

fn message_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "channel": {"type": "string"},
            "message": {"type": "string"}
        },
        "required": ["channel", "message"]
    })
}

fn interpreter_tool(targets: Vec<TargetAction>) -> AgenticTool {
    AgenticTool {
        id: Uuid::new_v4(),
        tenant_id: "tenant-1".to_string(),
        slug: "send-message".to_string(),
        name: "Send Message".to_string(),
        execution_mode: ExecutionMode::ParameterInterpreter,
        llm: llm_config(),
        system_prompt: "Translate the task into parameters. Task: {{user_input}}".to_string(),
        allocation: ToolAllocation::ParameterInterpreter {
            target_actions: targets,
        },
        context: ContextConfig::default(),
        safety: SafetyLimits::default(),
        status: ToolStatus::Active,
    }
}

fn slack_target() -> TargetAction {
    TargetAction {
        integration_slug: "slack".to_string(),
        action_slug: "post_message".to_string(),
        input_schema: message_schema(),
    }
}

fn agent_tool(max_tool_calls: u32) -> AgenticTool {
    AgenticTool {
        id: Uuid::new_v4(),
        tenant_id: "tenant-1".to_string(),
        slug: "slack-assistant".to_string(),
        name: "Slack Assistant".to_string(),
        execution_mode: ExecutionMode::AutonomousAgent,
        llm: llm_config(),
        system_prompt: "You can use: {{available_tools}}".to_string(),
        allocation: ToolAllocation::AutonomousAgent {
            available_tools: vec![AvailableTool {
                name: "send_message".to_string(),
                description: "Post a message to a channel".to_string(),
                integration_slug: "slack".to_string(),
                action_slug: "post_message".to_string(),
                input_schema: message_schema(),
            }],
        },
        context: ContextConfig::default(),
        safety: SafetyLimits {
            max_tool_calls,
            ..SafetyLimits::default()
        },
        status: ToolStatus::Active,
    }
}

struct Harness {
    handler: InvocationHandler,
    repository: Arc<InMemoryRepository>,
    gateway: Arc<RecordingGateway>,
    provider: Arc<ScriptedProvider>,
}

async fn harness(tool: AgenticTool, provider: Arc<ScriptedProvider>) -> Harness {
    harness_with_gateway(tool, provider, RecordingGateway::new()).await
}

async fn harness_with_gateway(
    tool: AgenticTool,
    provider: Arc<ScriptedProvider>,
    gateway: Arc<RecordingGateway>,
) -> Harness {
    let repository = Arc::new(InMemoryRepository::new());
    repository.insert_tool(tool).await;

    let factory = Arc::new(ProviderFactory::new(Settings::default()));
    factory.register("scripted", provider.clone() as Arc<dyn LlmProvider>);

    let handler = InvocationHandler::new(
        repository.clone(),
        gateway.clone(),
        Arc::new(EmptySchemaLoader),
        factory,
    );

    Harness {
        handler,
        repository,
        gateway,
        provider,
    }
}

// --- parameter interpreter -------------------------------------------------

#[tokio::test]
async fn test_interpreter_single_target_passthrough() {
    let provider = ScriptedProvider::new(vec![json_response(json!({
        "parameters": {"channel": "#general", "message": "hi team"}
    }))]);
    let h = harness(interpreter_tool(vec![slack_target()]), provider).await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi in general", InvokeOptions::default())
        .await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    let data = result.data.unwrap();
    assert_eq!(data["invoked"], "slack/post_message");
    assert_eq!(data["parameters"]["channel"], "#general");

    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(result.metadata.llm_calls.len(), 1);
    assert_eq!(result.metadata.tool_calls.len(), 1);
    assert!(result.metadata.total_cost > 0.0);
    assert_eq!(result.metadata.total_tokens, 150);

    let invocations = h.gateway.recorded();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].tenant_id, "tenant-1");
}

#[tokio::test]
async fn test_interpreter_rejects_missing_required_field() {
    let provider = ScriptedProvider::new(vec![json_response(json!({
        "parameters": {"channel": "#general"}
    }))]);
    let h = harness(interpreter_tool(vec![slack_target()]), provider).await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.code, "INVALID_GENERATED_PARAMETERS");
    let details = error.details.unwrap();
    assert!(details["validation_errors"].as_array().unwrap().iter().any(|e| {
        e["field"] == "message"
    }));

    // No action ran on invalid parameters.
    assert!(h.gateway.recorded().is_empty());
    assert_eq!(result.metadata.tool_calls.len(), 0);
}

#[tokio::test]
async fn test_interpreter_rejects_output_without_parameters() {
    let provider = ScriptedProvider::new(vec![json_response(json!({"answer": 42}))]);
    let h = harness(interpreter_tool(vec![slack_target()]), provider).await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "INVALID_LLM_OUTPUT");
    assert!(h.gateway.recorded().is_empty());
}

#[tokio::test]
async fn test_interpreter_multiple_targets_ordered_array() {
    let second = TargetAction {
        integration_slug: "slack".to_string(),
        action_slug: "pin_message".to_string(),
        input_schema: json!({}),
    };
    let provider = ScriptedProvider::new(vec![json_response(json!({
        "parameters": {"channel": "#general", "message": "hi"}
    }))]);
    let h = harness(interpreter_tool(vec![slack_target(), second]), provider).await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(result.success);
    let data = result.data.unwrap();
    let outputs = data.as_array().unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0]["invoked"], "slack/post_message");
    assert_eq!(outputs[1]["invoked"], "slack/pin_message");

    // Same generated parameters applied to every target, in order.
    let invocations = h.gateway.recorded();
    assert_eq!(invocations.len(), 2);
    assert_eq!(invocations[0].parameters, invocations[1].parameters);
}

#[tokio::test]
async fn test_interpreter_action_failure_aborts_remaining_targets() {
    let second = TargetAction {
        integration_slug: "slack".to_string(),
        action_slug: "pin_message".to_string(),
        input_schema: json!({}),
    };
    let provider = ScriptedProvider::new(vec![json_response(json!({
        "parameters": {"channel": "#general", "message": "hi"}
    }))]);
    let h = harness_with_gateway(
        interpreter_tool(vec![slack_target(), second]),
        provider,
        RecordingGateway::failing("channel is archived"),
    )
    .await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.code, "ACTION_EXECUTION_FAILED");
    assert!(error.message.contains("channel is archived"));

    // First target only; the failure aborted the second.
    assert_eq!(h.gateway.recorded().len(), 1);
    assert_eq!(result.metadata.tool_calls.len(), 1);
    assert!(!result.metadata.tool_calls[0].success);
}

// --- autonomous agent ------------------------------------------------------

#[tokio::test]
async fn test_agent_answers_without_tool_calls() {
    let provider = ScriptedProvider::new(vec![text_response("Nothing to do, all channels quiet.")]);
    let h = harness(agent_tool(10), provider).await;

    let result = h
        .handler
        .invoke("slack-assistant", "tenant-1", "check channels", InvokeOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(
        result.data.unwrap(),
        Value::String("Nothing to do, all channels quiet.".to_string())
    );
    assert_eq!(h.provider.call_count(), 1);
    assert!(result.metadata.tool_calls.is_empty());
    assert!(h.gateway.recorded().is_empty());
}

#[tokio::test]
async fn test_agent_runs_tool_then_answers() {
    let provider = ScriptedProvider::new(vec![
        tool_call_response("send_message", json!({"channel": "#general", "message": "hi"})),
        text_response("Message sent."),
    ]);
    let h = harness(agent_tool(10), provider).await;

    let result = h
        .handler
        .invoke("slack-assistant", "tenant-1", "say hi in general", InvokeOptions::default())
        .await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    assert_eq!(result.data.unwrap(), Value::String("Message sent.".to_string()));
    assert_eq!(h.provider.call_count(), 2);
    assert_eq!(result.metadata.llm_calls.len(), 2);
    assert_eq!(result.metadata.tool_calls.len(), 1);
    assert_eq!(h.gateway.recorded().len(), 1);
    assert_eq!(h.gateway.recorded()[0].action_slug, "post_message");
}

#[tokio::test]
async fn test_agent_tool_call_limit_stops_loop() {
    // Model keeps requesting tools; with a limit of 2 the third iteration
    // must fail before another LLM call is made.
    let provider = ScriptedProvider::new(vec![
        tool_call_response("send_message", json!({"channel": "#a", "message": "1"})),
        tool_call_response("send_message", json!({"channel": "#b", "message": "2"})),
        tool_call_response("send_message", json!({"channel": "#c", "message": "3"})),
    ]);
    let h = harness(agent_tool(2), provider).await;

    let result = h
        .handler
        .invoke("slack-assistant", "tenant-1", "spam everything", InvokeOptions::default())
        .await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.code, "MAX_TOOL_CALLS_EXCEEDED");

    // At most two executions happened, and the partial conversation is
    // available for diagnosis.
    assert_eq!(h.gateway.recorded().len(), 2);
    assert_eq!(result.metadata.tool_calls.len(), 2);
    let details = error.details.unwrap();
    assert_eq!(details["configured"], 2.0);
    assert!(details["partial"]["conversation"].is_array());
}

#[tokio::test]
async fn test_agent_unknown_tool_fed_back_without_burning_budget() {
    let provider = ScriptedProvider::new(vec![
        tool_call_response("delete_workspace", json!({})),
        text_response("That tool does not exist; nothing was done."),
    ]);
    let h = harness(agent_tool(10), provider).await;

    let result = h
        .handler
        .invoke("slack-assistant", "tenant-1", "clean up", InvokeOptions::default())
        .await;

    assert!(result.success);
    assert!(h.gateway.recorded().is_empty());
    assert!(result.metadata.tool_calls.is_empty());
    assert_eq!(h.provider.call_count(), 2);
}

#[tokio::test]
async fn test_agent_failed_tool_call_fed_back_as_data() {
    let provider = ScriptedProvider::new(vec![
        tool_call_response("send_message", json!({"channel": "#general", "message": "hi"})),
        text_response("The channel is archived, so nothing was sent."),
    ]);
    let h = harness_with_gateway(
        agent_tool(10),
        provider,
        RecordingGateway::failing("channel is archived"),
    )
    .await;

    let result = h
        .handler
        .invoke("slack-assistant", "tenant-1", "say hi in general", InvokeOptions::default())
        .await;

    // The gateway failure is data for the model, not a terminal error.
    assert!(result.success, "unexpected error: {:?}", result.error);
    assert_eq!(
        result.data.unwrap(),
        Value::String("The channel is archived, so nothing was sent.".to_string())
    );

    assert_eq!(result.metadata.tool_calls.len(), 1);
    assert!(!result.metadata.tool_calls[0].success);
    assert_eq!(
        result.metadata.tool_calls[0].error.as_deref(),
        Some("channel is archived")
    );

    // The second call's transcript carries the error-shaped tool turn.
    let prompts = h.provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains(r#"Tool (send_message): {"error":"channel is archived"}"#));
}

#[tokio::test]
async fn test_agent_cost_limit_enforced_after_llm_call() {
    let mut expensive = text_response("thinking...");
    expensive.cost = 0.05;
    expensive.tool_calls = vec![ToolCallRequest {
        id: "call-1".to_string(),
        name: "send_message".to_string(),
        input: json!({"channel": "#a", "message": "x"}),
    }];

    let mut tool = agent_tool(10);
    tool.safety.max_total_cost = 0.01;
    let provider = ScriptedProvider::new(vec![expensive]);
    let h = harness(tool, provider).await;

    let result = h
        .handler
        .invoke("slack-assistant", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "MAX_COST_EXCEEDED");
    // The breaching call is still accounted for.
    assert_eq!(result.metadata.llm_calls.len(), 1);
    assert!(h.gateway.recorded().is_empty());
}

// --- gates and lifecycle ---------------------------------------------------

#[tokio::test]
async fn test_disabled_tool_rejected_before_any_llm_call() {
    let mut tool = interpreter_tool(vec![slack_target()]);
    tool.status = ToolStatus::Disabled;
    let provider = ScriptedProvider::new(vec![]);
    let h = harness(tool, provider).await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "AGENTIC_TOOL_DISABLED");
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_draft_tool_rejected_with_invalid_status() {
    let mut tool = interpreter_tool(vec![slack_target()]);
    tool.status = ToolStatus::Draft;
    let provider = ScriptedProvider::new(vec![]);
    let h = harness(tool, provider).await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "INVALID_STATUS");
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_identifier_not_found() {
    let provider = ScriptedProvider::new(vec![]);
    let h = harness(interpreter_tool(vec![slack_target()]), provider).await;

    let result = h
        .handler
        .invoke("no-such-tool", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "AGENTIC_TOOL_NOT_FOUND");
    assert!(result.metadata.llm_calls.is_empty());
    assert!(result.metadata.tool_id.is_none());
}

#[tokio::test]
async fn test_tenant_isolation_on_lookup() {
    let provider = ScriptedProvider::new(vec![]);
    let h = harness(interpreter_tool(vec![slack_target()]), provider).await;

    let result = h
        .handler
        .invoke("send-message", "other-tenant", "say hi", InvokeOptions::default())
        .await;

    assert_eq!(result.error.unwrap().code, "AGENTIC_TOOL_NOT_FOUND");
}

#[tokio::test]
async fn test_execution_record_persisted_once_on_success() {
    let provider = ScriptedProvider::new(vec![json_response(json!({
        "parameters": {"channel": "#general", "message": "hi"}
    }))]);
    let h = harness(interpreter_tool(vec![slack_target()]), provider).await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    let records = h.repository.executions().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.status, ExecutionStatus::Success);
    assert_eq!(record.input, "say hi");
    assert_eq!(record.llm_calls.len(), 1);
    assert_eq!(record.tool_calls.len(), 1);
    assert_eq!(record.trace_id, result.metadata.trace_id);
    assert_eq!(Some(record.id), result.metadata.execution_id);
}

#[tokio::test]
async fn test_execution_record_persisted_on_failure_too() {
    let provider = ScriptedProvider::new(vec![json_response(json!({
        "parameters": {"channel": "#general"}
    }))]);
    let h = harness(interpreter_tool(vec![slack_target()]), provider).await;

    h.handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    let records = h.repository.executions().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ExecutionStatus::Error);
    assert_eq!(
        records[0].error.as_ref().unwrap().code,
        "INVALID_GENERATED_PARAMETERS"
    );
    // The LLM call that produced the bad output is still on the record.
    assert_eq!(records[0].llm_calls.len(), 1);
}

#[tokio::test]
async fn test_timeout_recorded_with_timeout_status() {
    // A zero-second ceiling trips the inclusive timeout check before the
    // first LLM call.
    let mut tool = interpreter_tool(vec![slack_target()]);
    tool.safety.timeout_seconds = 0;
    let provider = ScriptedProvider::new(vec![]);
    let h = harness(tool, provider).await;

    let result = h
        .handler
        .invoke("send-message", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.unwrap().code, "TIMEOUT");
    assert_eq!(h.provider.call_count(), 0);

    let records = h.repository.executions().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ExecutionStatus::Timeout);
}

#[tokio::test]
async fn test_no_execution_record_when_logging_disabled() {
    let provider = ScriptedProvider::new(vec![json_response(json!({
        "parameters": {"channel": "#general", "message": "hi"}
    }))]);
    let h = harness(interpreter_tool(vec![slack_target()]), provider).await;

    let result = h
        .handler
        .invoke(
            "send-message",
            "tenant-1",
            "say hi",
            InvokeOptions {
                log_execution: false,
                ..InvokeOptions::default()
            },
        )
        .await;

    assert!(result.success);
    assert!(result.metadata.execution_id.is_none());
    assert!(h.repository.executions().await.is_empty());
}

#[tokio::test]
async fn test_tracing_sink_receives_every_call() {
    let provider = ScriptedProvider::new(vec![
        tool_call_response("send_message", json!({"channel": "#a", "message": "1"})),
        text_response("done"),
    ]);

    let repository = Arc::new(InMemoryRepository::new());
    repository.insert_tool(agent_tool(10)).await;
    let gateway = RecordingGateway::new();
    let factory = Arc::new(ProviderFactory::new(Settings::default()));
    factory.register("scripted", provider.clone() as Arc<dyn LlmProvider>);

    let sink = Arc::new(CountingSink {
        llm: AtomicUsize::new(0),
        tool: AtomicUsize::new(0),
    });
    let handler = InvocationHandler::new(
        repository,
        gateway,
        Arc::new(EmptySchemaLoader),
        factory,
    )
    .with_tracing_sink(sink.clone());

    let result = handler
        .invoke("slack-assistant", "tenant-1", "say hi", InvokeOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(sink.llm.load(Ordering::SeqCst), result.metadata.llm_calls.len());
    assert_eq!(sink.tool.load(Ordering::SeqCst), result.metadata.tool_calls.len());
}

#[tokio::test]
async fn test_tool_definition_loads_from_json_file() {
    use std::io::Write as _;

    let definition = serde_json::to_string_pretty(&interpreter_tool(vec![slack_target()])).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tool.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(definition.as_bytes()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed: AgenticTool = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.slug, "send-message");
    assert!(parsed.config_issues().is_empty());
}
