//! Engine error taxonomy.
//!
//! Every failure that can cross the invocation boundary is normalized into
//! an `ErrorEnvelope` with a stable machine code. Nothing escapes the
//! handler as a raw error or panic.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::engine::validation::ValidationError;

/// Which safety limit was breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    ToolCalls,
    Timeout,
    Cost,
}

impl LimitKind {
    pub fn code(&self) -> &'static str {
        match self {
            LimitKind::ToolCalls => "MAX_TOOL_CALLS_EXCEEDED",
            LimitKind::Timeout => "TIMEOUT",
            LimitKind::Cost => "MAX_COST_EXCEEDED",
        }
    }
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitKind::ToolCalls => write!(f, "max_tool_calls"),
            LimitKind::Timeout => write!(f, "timeout_seconds"),
            LimitKind::Cost => write!(f, "max_total_cost"),
        }
    }
}

/// A single limit breach: which limit, what was configured, what was observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyViolation {
    pub limit: LimitKind,
    pub configured: f64,
    pub observed: f64,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("agentic tool '{identifier}' not found for tenant '{tenant_id}'")]
    ToolNotFound { identifier: String, tenant_id: String },

    #[error("agentic tool '{slug}' is disabled")]
    ToolDisabled { slug: String },

    #[error("agentic tool '{slug}' has status '{status}' and cannot be invoked")]
    InvalidStatus { slug: String, status: String },

    #[error("tool allocation does not match execution mode '{expected}'")]
    InvalidExecutionMode { expected: String },

    #[error("parameter_interpreter tool has no target actions")]
    NoTargetActions,

    #[error("autonomous_agent tool has no available tools")]
    NoAvailableTools,

    #[error("LLM output was not usable: {reason}")]
    InvalidLlmOutput { reason: String },

    #[error("generated parameters failed schema validation ({} error(s))", errors.len())]
    InvalidGeneratedParameters { errors: Vec<ValidationError> },

    #[error("action '{integration_slug}/{action_slug}' failed: {message}")]
    ActionExecutionFailed {
        integration_slug: String,
        action_slug: String,
        message: String,
    },

    #[error("safety limit '{}' exceeded: observed {} >= configured {}", violation.limit, violation.observed, violation.configured)]
    SafetyLimit {
        violation: SafetyViolation,
        /// Autonomous mode attaches iteration counts and the partial
        /// conversation here for operator diagnosis.
        diagnostics: Option<Value>,
    },

    #[error("provider '{provider}' call failed: {message}")]
    Provider { provider: String, message: String },

    #[error("{0}")]
    Unknown(String),
}

impl EngineError {
    pub fn safety(violation: SafetyViolation) -> Self {
        EngineError::SafetyLimit {
            violation,
            diagnostics: None,
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Stable machine code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ToolNotFound { .. } => "AGENTIC_TOOL_NOT_FOUND",
            EngineError::ToolDisabled { .. } => "AGENTIC_TOOL_DISABLED",
            EngineError::InvalidStatus { .. } => "INVALID_STATUS",
            EngineError::InvalidExecutionMode { .. } => "INVALID_EXECUTION_MODE",
            EngineError::NoTargetActions => "NO_TARGET_ACTIONS",
            EngineError::NoAvailableTools => "NO_AVAILABLE_TOOLS",
            EngineError::InvalidLlmOutput { .. } => "INVALID_LLM_OUTPUT",
            EngineError::InvalidGeneratedParameters { .. } => "INVALID_GENERATED_PARAMETERS",
            EngineError::ActionExecutionFailed { .. } => "ACTION_EXECUTION_FAILED",
            EngineError::SafetyLimit { violation, .. } => violation.limit.code(),
            EngineError::Provider { .. } => "PROVIDER_ERROR",
            EngineError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Structured detail payload, when the variant carries one.
    pub fn details(&self) -> Option<Value> {
        match self {
            EngineError::InvalidGeneratedParameters { errors } => {
                Some(json!({ "validation_errors": errors }))
            }
            EngineError::SafetyLimit {
                violation,
                diagnostics,
            } => {
                let mut details = json!({
                    "limit": violation.limit.to_string(),
                    "configured": violation.configured,
                    "observed": violation.observed,
                });
                if let Some(diag) = diagnostics {
                    details["partial"] = diag.clone();
                }
                Some(details)
            }
            _ => None,
        }
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }
}

/// Normalized error shape crossing the invocation boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
