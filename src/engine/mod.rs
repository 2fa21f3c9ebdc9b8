//! Orchestration engine: invocation entry point and the two execution
//! strategies (single-shot parameter interpreter, bounded autonomous loop).

pub mod agent;
pub mod conversation;
pub mod handler;
pub mod interpreter;
pub mod validation;

pub use handler::{InvocationHandler, InvocationMetadata, InvocationResult, InvokeOptions};

use serde_json::Value;

use crate::core::error::EngineError;
use crate::core::llm::LlmResponse;
use crate::model::{LlmCallRecord, ToolCallRecord};

/// Per-invocation accumulators shared by both orchestrators. Everything in
/// here ends up in the execution record and the returned metadata, whether
/// the run succeeded or not.
#[derive(Debug, Default)]
pub(crate) struct RunTotals {
    pub llm_calls: Vec<LlmCallRecord>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub total_cost: f64,
    pub total_tokens: u64,
}

impl RunTotals {
    /// Fold an LLM response into the totals and return its call record.
    pub fn record_llm(&mut self, response: &LlmResponse) -> LlmCallRecord {
        let record = LlmCallRecord {
            provider: response.provider.clone(),
            model: response.model.clone(),
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
            cost: response.cost,
            duration_ms: response.duration_ms,
        };
        self.total_cost += response.cost;
        self.total_tokens += response.usage.total_tokens as u64;
        self.llm_calls.push(record.clone());
        record
    }

    pub fn record_tool(&mut self, record: ToolCallRecord) -> ToolCallRecord {
        self.tool_calls.push(record.clone());
        record
    }
}

/// What an orchestrator hands back to the invocation handler: the outcome
/// plus every accumulated call record, so failed runs are audited exactly
/// like successful ones.
pub(crate) struct OrchestrationReport {
    pub result: Result<Value, EngineError>,
    pub totals: RunTotals,
}
