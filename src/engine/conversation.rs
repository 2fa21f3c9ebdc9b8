//! Conversation state for the autonomous loop.
//!
//! Turns are kept structured; the string transcript is rendered only at the
//! provider boundary. Tool-call/tool-result ordering is preserved exactly as
//! the turns were appended.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationTurn {
    User { content: String },
    Assistant { content: String },
    Tool { name: String, content: String },
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            turns: vec![ConversationTurn::User {
                content: task.into(),
            }],
        }
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn::Assistant {
            content: content.into(),
        });
    }

    pub fn push_tool(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.turns.push(ConversationTurn::Tool {
            name: name.into(),
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Flatten the history into the transcript form fed to the provider.
    pub fn render_transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| match turn {
                ConversationTurn::User { content } => format!("User: {content}"),
                ConversationTurn::Assistant { content } => format!("Assistant: {content}"),
                ConversationTurn::Tool { name, content } => format!("Tool ({name}): {content}"),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Structured history for safety-limit diagnostics.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.turns).unwrap_or(Value::Null)
    }
}
