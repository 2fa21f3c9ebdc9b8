//! Usage-based cost accounting.
//!
//! Per-provider price tables in USD per 1M tokens, matched by exact model
//! name first, then by longest prefix. Unrecognized models fall back to a
//! conservative default (never under-estimates) with a logged warning.
//! The computation is pure so it can be unit tested without network calls.

/// Price for one model, USD per 1M tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Fallback for unknown models. Matches the most expensive table entry so a
/// mispriced model can only over-count toward the cost ceiling.
pub const DEFAULT_PRICE: ModelPrice = ModelPrice {
    input_per_million: 15.0,
    output_per_million: 75.0,
};

const OPENAI_PRICES: &[(&str, ModelPrice)] = &[
    ("gpt-4o", ModelPrice { input_per_million: 2.50, output_per_million: 10.0 }),
    ("gpt-4o-mini", ModelPrice { input_per_million: 0.15, output_per_million: 0.60 }),
    ("gpt-4.1", ModelPrice { input_per_million: 2.00, output_per_million: 8.0 }),
    ("gpt-4.1-mini", ModelPrice { input_per_million: 0.40, output_per_million: 1.60 }),
    ("o3", ModelPrice { input_per_million: 10.0, output_per_million: 40.0 }),
    ("o4-mini", ModelPrice { input_per_million: 1.10, output_per_million: 4.40 }),
];

const ANTHROPIC_PRICES: &[(&str, ModelPrice)] = &[
    ("claude-3-5-haiku", ModelPrice { input_per_million: 0.80, output_per_million: 4.0 }),
    ("claude-sonnet-4", ModelPrice { input_per_million: 3.0, output_per_million: 15.0 }),
    ("claude-opus-4", ModelPrice { input_per_million: 15.0, output_per_million: 75.0 }),
];

fn price_table(provider: &str) -> &'static [(&'static str, ModelPrice)] {
    match provider.to_lowercase().as_str() {
        "openai" => OPENAI_PRICES,
        "anthropic" => ANTHROPIC_PRICES,
        _ => &[],
    }
}

/// Look up the price for a model: exact match, then longest matching prefix,
/// then the conservative default with a warning.
pub fn price_for_model(provider: &str, model: &str) -> ModelPrice {
    let table = price_table(provider);

    if let Some((_, price)) = table.iter().find(|(name, _)| *name == model) {
        return *price;
    }

    // Longest prefix wins so "gpt-4o-mini-2024-07-18" matches "gpt-4o-mini",
    // not "gpt-4o".
    let prefix_match = table
        .iter()
        .filter(|(name, _)| model.starts_with(name))
        .max_by_key(|(name, _)| name.len());

    if let Some((name, price)) = prefix_match {
        tracing::debug!(provider, model, matched = name, "priced model by prefix");
        return *price;
    }

    tracing::warn!(
        provider,
        model,
        "unrecognized model, falling back to conservative default pricing"
    );
    DEFAULT_PRICE
}

/// Cost in USD for a single call, rounded to six decimal places.
pub fn calculate_cost(provider: &str, model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    let price = price_for_model(provider, model);
    let cost = (input_tokens as f64 / 1_000_000.0) * price.input_per_million
        + (output_tokens as f64 / 1_000_000.0) * price.output_per_million;
    round6(cost)
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
