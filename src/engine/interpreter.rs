//! Parameter-interpreter orchestration.
//!
//! One LLM call turns the task into structured parameters; the parameters
//! are validated against the first target action's schema and then applied
//! to every declared target in order. A failed action aborts the remaining
//! targets.

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::{build_context, template::process_prompt};
use crate::core::error::EngineError;
use crate::core::llm::{LlmRequest, LlmResponseFormat};
use crate::core::safety::SafetyEnforcer;
use crate::engine::handler::{InvocationHandler, InvokeOptions};
use crate::engine::{OrchestrationReport, RunTotals};
use crate::model::{AgenticTool, TargetAction, ToolAllocation, ToolCallRecord};
use crate::ports::ActionInvocation;

impl InvocationHandler {
    pub(crate) async fn run_interpreter(
        &self,
        tool: &AgenticTool,
        task: &str,
        enforcer: &SafetyEnforcer,
        options: &InvokeOptions,
        trace_id: &str,
    ) -> OrchestrationReport {
        let mut totals = RunTotals::default();
        let result = self
            .interpret(tool, task, enforcer, options, trace_id, &mut totals)
            .await;
        OrchestrationReport { result, totals }
    }

    async fn interpret(
        &self,
        tool: &AgenticTool,
        task: &str,
        enforcer: &SafetyEnforcer,
        options: &InvokeOptions,
        trace_id: &str,
        totals: &mut RunTotals,
    ) -> Result<Value, EngineError> {
        let ToolAllocation::ParameterInterpreter { target_actions } = &tool.allocation else {
            return Err(EngineError::InvalidExecutionMode {
                expected: tool.execution_mode.to_string(),
            });
        };
        if target_actions.is_empty() {
            return Err(EngineError::NoTargetActions);
        }
        if target_actions.len() > 1 {
            // Validation only covers the first target's schema; later targets
            // receive the same parameters unchecked.
            warn!(
                "[{}] tool '{}' declares {} target actions; parameters are validated against the first only",
                trace_id,
                tool.slug,
                target_actions.len()
            );
        }

        enforcer.check_timeout()?;
        enforcer.check_cost_limit(totals.total_cost)?;

        let context = build_context(self.schemas(), tool, task, None)
            .await
            .map_err(|e| EngineError::Unknown(format!("context assembly failed: {e:#}")))?;
        let processed = process_prompt(&tool.system_prompt, &context);

        let provider = self.providers().get(&tool.llm)?;
        let request = LlmRequest {
            prompt: task.to_string(),
            system_prompt: Some(processed.processed_prompt),
            temperature: Some(tool.llm.temperature),
            max_tokens: Some(tool.llm.max_tokens),
            response_format: LlmResponseFormat::Json,
            tools: Vec::new(),
        };

        let response = provider.call(request).await?;
        let record = totals.record_llm(&response);
        self.tracing_sink().log_llm_call(trace_id, &record).await;
        enforcer.check_cost_limit(totals.total_cost)?;

        let content = match response.content {
            Some(value) => value,
            None => crate::core::llm::extract_json_object(&response.raw_text)?,
        };
        let parameters = content
            .get("parameters")
            .filter(|p| p.is_object())
            .cloned()
            .ok_or_else(|| EngineError::InvalidLlmOutput {
                reason: "output has no 'parameters' object".to_string(),
            })?;

        let errors = crate::engine::validation::validate_parameters(
            &parameters,
            &target_actions[0].input_schema,
        );
        if !errors.is_empty() {
            return Err(EngineError::InvalidGeneratedParameters { errors });
        }

        debug!(
            "[{}] generated parameters validated, executing {} target action(s)",
            trace_id,
            target_actions.len()
        );

        let mut outputs = Vec::with_capacity(target_actions.len());
        for action in target_actions {
            enforcer.check_timeout()?;
            let output = self
                .execute_target(tool, action, &parameters, options, trace_id, totals)
                .await?;
            outputs.push(output);
        }

        if outputs.len() == 1 {
            Ok(outputs.into_iter().next().unwrap_or(Value::Null))
        } else {
            Ok(Value::Array(outputs))
        }
    }

    async fn execute_target(
        &self,
        tool: &AgenticTool,
        action: &TargetAction,
        parameters: &Value,
        options: &InvokeOptions,
        trace_id: &str,
        totals: &mut RunTotals,
    ) -> Result<Value, EngineError> {
        let started = std::time::Instant::now();
        let outcome = self
            .gateway()
            .invoke_action(ActionInvocation {
                tenant_id: tool.tenant_id.clone(),
                integration_slug: action.integration_slug.clone(),
                action_slug: action.action_slug.clone(),
                parameters: parameters.clone(),
                connection_id: options.connection_id.clone(),
                request_id: options.request_id.clone(),
            })
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let record = totals.record_tool(ToolCallRecord {
            tool_name: action.action_slug.clone(),
            integration_slug: action.integration_slug.clone(),
            action_slug: action.action_slug.clone(),
            input: parameters.clone(),
            output: outcome.data.clone(),
            error: outcome.error.as_ref().map(|e| e.message.clone()),
            duration_ms,
            success: outcome.success,
        });
        self.tracing_sink().log_tool_call(trace_id, &record).await;

        if !outcome.success {
            let message = outcome
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "action returned no error detail".to_string());
            return Err(EngineError::ActionExecutionFailed {
                integration_slug: action.integration_slug.clone(),
                action_slug: action.action_slug.clone(),
                message,
            });
        }

        Ok(outcome.data.unwrap_or(Value::Null))
    }
}
