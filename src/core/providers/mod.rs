//! Concrete LLM provider clients.
//!
//! Each client implements the common `LlmProvider` contract; callers never
//! branch on which one they hold. Neither client retries: a failed call is
//! terminal for the current invocation (or fed back to the model as data,
//! in autonomous mode).

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
