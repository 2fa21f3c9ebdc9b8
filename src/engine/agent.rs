//! Autonomous-agent orchestration.
//!
//! A bounded loop: the model sees the transcript and a tool menu, either
//! requests tool calls or produces a final answer. Safety limits are
//! re-checked at every iteration and before every individual tool call, and
//! a breach surfaces the partial conversation in the error diagnostics.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::context::{build_context, template::process_prompt};
use crate::core::error::EngineError;
use crate::core::llm::{LlmRequest, LlmResponseFormat, ToolCallRequest, ToolSpec};
use crate::core::safety::SafetyEnforcer;
use crate::engine::conversation::Conversation;
use crate::engine::handler::{InvocationHandler, InvokeOptions};
use crate::engine::{OrchestrationReport, RunTotals};
use crate::model::{AgenticTool, AvailableTool, ToolAllocation, ToolCallRecord};
use crate::ports::ActionInvocation;

impl InvocationHandler {
    pub(crate) async fn run_agent(
        &self,
        tool: &AgenticTool,
        task: &str,
        enforcer: &SafetyEnforcer,
        options: &InvokeOptions,
        trace_id: &str,
    ) -> OrchestrationReport {
        let mut totals = RunTotals::default();
        let result = self
            .agent_loop(tool, task, enforcer, options, trace_id, &mut totals)
            .await;
        OrchestrationReport { result, totals }
    }

    async fn agent_loop(
        &self,
        tool: &AgenticTool,
        task: &str,
        enforcer: &SafetyEnforcer,
        options: &InvokeOptions,
        trace_id: &str,
        totals: &mut RunTotals,
    ) -> Result<Value, EngineError> {
        let ToolAllocation::AutonomousAgent { available_tools } = &tool.allocation else {
            return Err(EngineError::InvalidExecutionMode {
                expected: tool.execution_mode.to_string(),
            });
        };
        if available_tools.is_empty() {
            return Err(EngineError::NoAvailableTools);
        }

        let context = build_context(self.schemas(), tool, task, Some(available_tools.as_slice()))
            .await
            .map_err(|e| EngineError::Unknown(format!("context assembly failed: {e:#}")))?;
        let system_prompt = process_prompt(&tool.system_prompt, &context).processed_prompt;

        let tool_specs: Vec<ToolSpec> = available_tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect();

        let provider = self.providers().get(&tool.llm)?;
        let mut conversation = Conversation::new(task);
        let mut tool_call_count: u32 = 0;
        let mut iteration: u32 = 0;

        loop {
            iteration += 1;
            enforcer
                .check_timeout()
                .and_then(|_| enforcer.check_cost_limit(totals.total_cost))
                .and_then(|_| enforcer.check_tool_call_limit(tool_call_count))
                .map_err(|e| with_partial(e, &conversation, iteration, tool_call_count))?;

            debug!(
                "[{}] agent iteration {} (tool calls so far: {})",
                trace_id, iteration, tool_call_count
            );

            let request = LlmRequest {
                prompt: conversation.render_transcript(),
                system_prompt: Some(system_prompt.clone()),
                temperature: Some(tool.llm.temperature),
                max_tokens: Some(tool.llm.max_tokens),
                response_format: LlmResponseFormat::Text,
                tools: tool_specs.clone(),
            };
            let response = provider.call(request).await?;
            let record = totals.record_llm(&response);
            self.tracing_sink().log_llm_call(trace_id, &record).await;
            enforcer
                .check_cost_limit(totals.total_cost)
                .map_err(|e| with_partial(e, &conversation, iteration, tool_call_count))?;

            if response.tool_calls.is_empty() {
                conversation.push_assistant(&response.raw_text);
                info!(
                    "[{}] agent finished after {} iteration(s), {} tool call(s)",
                    trace_id, iteration, tool_call_count
                );
                return Ok(Value::String(response.raw_text));
            }

            conversation.push_assistant(describe_tool_calls(
                &response.raw_text,
                &response.tool_calls,
            ));

            for call in &response.tool_calls {
                enforcer
                    .check_timeout()
                    .and_then(|_| enforcer.check_cost_limit(totals.total_cost))
                    .and_then(|_| enforcer.check_tool_call_limit(tool_call_count))
                    .map_err(|e| with_partial(e, &conversation, iteration, tool_call_count))?;

                let Some(target) = available_tools.iter().find(|t| t.name == call.name) else {
                    // Not an action call; feed the mistake back so the model
                    // can correct itself without burning the call budget.
                    warn!("[{}] model requested unknown tool '{}'", trace_id, call.name);
                    conversation.push_tool(
                        &call.name,
                        json!({"error": format!("unknown tool '{}'", call.name)}).to_string(),
                    );
                    continue;
                };

                let outcome = self
                    .execute_agent_tool(tool, target, call, options, trace_id, totals)
                    .await;
                tool_call_count += 1;
                conversation.push_tool(&call.name, outcome);
            }
        }
    }

    /// Run one requested tool call through the gateway. Failures come back
    /// as an error payload for the model rather than terminating the loop.
    async fn execute_agent_tool(
        &self,
        tool: &AgenticTool,
        target: &AvailableTool,
        call: &ToolCallRequest,
        options: &InvokeOptions,
        trace_id: &str,
        totals: &mut RunTotals,
    ) -> String {
        let started = std::time::Instant::now();
        let outcome = self
            .gateway()
            .invoke_action(ActionInvocation {
                tenant_id: tool.tenant_id.clone(),
                integration_slug: target.integration_slug.clone(),
                action_slug: target.action_slug.clone(),
                parameters: call.input.clone(),
                connection_id: options.connection_id.clone(),
                request_id: options.request_id.clone(),
            })
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let record = totals.record_tool(ToolCallRecord {
            tool_name: target.name.clone(),
            integration_slug: target.integration_slug.clone(),
            action_slug: target.action_slug.clone(),
            input: call.input.clone(),
            output: outcome.data.clone(),
            error: outcome.error.as_ref().map(|e| e.message.clone()),
            duration_ms,
            success: outcome.success,
        });
        self.tracing_sink().log_tool_call(trace_id, &record).await;

        if outcome.success {
            outcome.data.unwrap_or(Value::Null).to_string()
        } else {
            let message = outcome
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "action returned no error detail".to_string());
            json!({"error": message}).to_string()
        }
    }
}

/// Assistant-turn text for a tool-requesting response. Models frequently
/// return empty text alongside tool calls.
fn describe_tool_calls(raw_text: &str, calls: &[ToolCallRequest]) -> String {
    if !raw_text.trim().is_empty() {
        return raw_text.to_string();
    }
    let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
    format!("[requesting tools: {}]", names.join(", "))
}

/// Attach the partial conversation to a safety-limit error.
fn with_partial(
    error: EngineError,
    conversation: &Conversation,
    iterations: u32,
    tool_calls: u32,
) -> EngineError {
    match error {
        EngineError::SafetyLimit { violation, .. } => EngineError::SafetyLimit {
            violation,
            diagnostics: Some(json!({
                "iterations": iterations,
                "tool_calls": tool_calls,
                "conversation": conversation.to_json(),
            })),
        },
        other => other,
    }
}
