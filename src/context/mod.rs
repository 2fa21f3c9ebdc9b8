//! Prompt context assembly.
//!
//! Loads configured context sources, renders them into strings, and exposes
//! the flat variable map consumed by template substitution. Reference data
//! is capped at 500 rows and only whitelisted metadata fields are rendered
//! into prompts.

pub mod template;

use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;

use crate::model::{AgenticTool, AvailableTool, ContextConfig, ContextVariable};
use crate::ports::{IntegrationSchema, ReferenceRow, SchemaLoader};

pub use template::{process_prompt, ProcessedPrompt};

/// Upper bound on reference rows rendered into a prompt.
pub const REFERENCE_ROW_CAP: usize = 500;

/// Metadata fields allowed into prompts. Everything else stays out, whatever
/// the rows carry.
const METADATA_WHITELIST: &[&str] = &["category", "status", "description", "owner"];

/// Flat variable map fed into `process_prompt`.
pub type PromptContext = HashMap<String, String>;

/// Assemble the prompt context for one invocation.
///
/// Explicitly configured variables load first; `auto_inject_schemas` then
/// adds a `<integration>_schema` entry for every integration the tool's
/// allocation references, without clobbering explicit entries. The raw task
/// text is always available as `user_input`, and `available_tools` renders
/// the agent-mode tool menu.
pub async fn build_context(
    loader: &dyn SchemaLoader,
    tool: &AgenticTool,
    user_input: &str,
    available_tools: Option<&[AvailableTool]>,
) -> Result<PromptContext> {
    let mut context = PromptContext::new();
    context.insert("user_input".to_string(), user_input.to_string());

    load_configured_variables(loader, &tool.tenant_id, &tool.context, &mut context).await?;

    if tool.context.auto_inject_schemas {
        for slug in tool.referenced_integrations() {
            let key = format!("{}_schema", slug);
            if context.contains_key(&key) {
                continue;
            }
            let schema = loader.load_integration_schema(&tool.tenant_id, &slug).await?;
            context.insert(key, render_integration_schema(&schema));
        }
    }

    if let Some(tools) = available_tools {
        context.insert("available_tools".to_string(), render_tool_menu(tools));
    }

    tracing::debug!(
        tool = %tool.slug,
        variables = context.len(),
        "prompt context assembled"
    );

    Ok(context)
}

async fn load_configured_variables(
    loader: &dyn SchemaLoader,
    tenant_id: &str,
    config: &ContextConfig,
    context: &mut PromptContext,
) -> Result<()> {
    for (name, variable) in &config.variables {
        let value = match variable {
            ContextVariable::IntegrationSchema { source } => {
                let schema = loader.load_integration_schema(tenant_id, source).await?;
                render_integration_schema(&schema)
            }
            ContextVariable::ReferenceData { source } => {
                let rows = loader.load_reference_data(tenant_id, source).await?;
                render_reference_data(source, &rows)
            }
            ContextVariable::Custom { value } => value.clone(),
        };
        context.insert(name.clone(), value);
    }
    Ok(())
}

/// Render an integration's action catalog as a Markdown block.
pub fn render_integration_schema(schema: &IntegrationSchema) -> String {
    let mut out = format!("## Integration: {}\n", schema.integration);

    if schema.actions.is_empty() {
        out.push_str("\n(no actions available)\n");
        return out;
    }

    for action in &schema.actions {
        out.push_str(&format!(
            "\n### {} ({})\n{}\n",
            action.name, action.method, action.description
        ));
        if !action.input_schema.is_null() {
            out.push_str(&format!(
                "Input schema:\n```json\n{}\n```\n",
                serde_json::to_string_pretty(&action.input_schema)
                    .unwrap_or_else(|_| "{}".to_string())
            ));
        }
    }

    out
}

/// Render reference rows as a bulleted list, capped and whitelisted.
pub fn render_reference_data(data_type: &str, rows: &[ReferenceRow]) -> String {
    let mut out = format!("Reference data ({data_type}):\n");

    for row in rows.iter().take(REFERENCE_ROW_CAP) {
        out.push_str(&format!("- {} ({})", row.name, row.external_id));

        let fields = whitelisted_metadata(&row.metadata);
        if !fields.is_empty() {
            out.push_str(&format!(" [{}]", fields.join(", ")));
        }
        out.push('\n');
    }

    if rows.len() > REFERENCE_ROW_CAP {
        out.push_str(&format!(
            "... truncated to the first {REFERENCE_ROW_CAP} of {} rows\n",
            rows.len()
        ));
    }

    out
}

fn whitelisted_metadata(metadata: &Value) -> Vec<String> {
    let Some(object) = metadata.as_object() else {
        return Vec::new();
    };

    METADATA_WHITELIST
        .iter()
        .filter_map(|field| {
            object.get(*field).map(|value| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{field}: {rendered}")
            })
        })
        .collect()
}

/// Numbered `name: description` list for the agent-mode prompt.
pub fn render_tool_menu(tools: &[AvailableTool]) -> String {
    tools
        .iter()
        .enumerate()
        .map(|(i, tool)| format!("{}. {}: {}", i + 1, tool.name, tool.description))
        .collect::<Vec<_>>()
        .join("\n")
}
