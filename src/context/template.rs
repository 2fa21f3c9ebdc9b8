//! `{{variable}}` substitution into prompt templates.
//!
//! Placeholders with a matching context key are replaced with its value;
//! everything else becomes the empty string and is reported as missing.
//! Missing variables are diagnostics, never a hard error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*)\}\}").expect("placeholder regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedPrompt {
    pub processed_prompt: String,
    pub replaced_variables: Vec<String>,
    pub missing_variables: Vec<String>,
}

pub fn process_prompt(template: &str, context: &HashMap<String, String>) -> ProcessedPrompt {
    let mut replaced = Vec::new();
    let mut missing = Vec::new();

    let processed = PLACEHOLDER
        .replace_all(template, |captures: &regex::Captures<'_>| {
            let name = &captures[1];
            match context.get(name) {
                Some(value) => {
                    push_unique(&mut replaced, name);
                    value.clone()
                }
                None => {
                    push_unique(&mut missing, name);
                    String::new()
                }
            }
        })
        .into_owned();

    if !missing.is_empty() {
        tracing::debug!(missing = ?missing, "prompt template had unresolved variables");
    }

    ProcessedPrompt {
        processed_prompt: processed,
        replaced_variables: replaced,
        missing_variables: missing,
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}
