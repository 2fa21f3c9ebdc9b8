//! Toolflow - LLM-fronted orchestration of tenant-configured tools.
//!
//! A tool wraps one or more downstream API actions behind a configured
//! LLM. Invocations run in one of two modes: a single-shot parameter
//! interpreter, or a bounded autonomous agent loop. Safety limits on tool
//! calls, wall-clock time, and cost are enforced on every invocation.

pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod engine;
pub mod model;
pub mod ports;
pub mod utils;

pub use config::Settings;
pub use core::error::{EngineError, ErrorEnvelope};
pub use core::llm::{LlmProvider, LlmRequest, LlmResponse, ProviderFactory};
pub use core::safety::SafetyEnforcer;
pub use engine::{InvocationHandler, InvocationMetadata, InvocationResult, InvokeOptions};
pub use model::{AgenticTool, ExecutionMode, ToolStatus};
