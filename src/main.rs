use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use toolflow::cli::{Cli, Commands};
use toolflow::core::cost;
use toolflow::model::AgenticTool;
use toolflow::ports::memory::{DryRunGateway, EmptySchemaLoader, InMemoryRepository};
use toolflow::{utils, InvocationHandler, InvokeOptions, ProviderFactory, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new().context("failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone())),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Invoke {
            tool_file,
            task,
            tenant,
            connection,
            no_log,
        } => handle_invoke(settings, tool_file, task, tenant, connection, no_log).await,
        Commands::Check { tool_file } => handle_check(tool_file).await,
        Commands::Pricing { provider, model } => handle_pricing(provider, model),
    }
}

async fn load_tool(path: &str) -> Result<AgenticTool> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read tool definition '{path}'"))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid tool definition in '{path}'"))
}

async fn handle_invoke(
    settings: Settings,
    tool_file: String,
    task: String,
    tenant: String,
    connection: Option<String>,
    no_log: bool,
) -> Result<()> {
    let mut tool = load_tool(&tool_file).await?;
    tool.tenant_id = tenant.clone();
    let identifier = tool.slug.clone();

    let repository = Arc::new(InMemoryRepository::new());
    repository.insert_tool(tool).await;

    let handler = InvocationHandler::new(
        repository,
        Arc::new(DryRunGateway),
        Arc::new(EmptySchemaLoader),
        Arc::new(ProviderFactory::new(settings)),
    );

    utils::print_info(&format!("Invoking '{identifier}'..."));
    let result = handler
        .invoke(
            &identifier,
            &tenant,
            &task,
            InvokeOptions {
                request_id: None,
                connection_id: connection,
                log_execution: !no_log,
            },
        )
        .await;

    utils::print_header("Result");
    if result.success {
        utils::print_success("Success");
        if let Some(data) = &result.data {
            utils::print_json(data);
        }
    } else if let Some(error) = &result.error {
        utils::print_error(&format!("{}: {}", error.code, error.message));
        if let Some(details) = &error.details {
            utils::print_json(details);
        }
    }

    utils::print_header("Metadata");
    utils::print_kv("trace id", &result.metadata.trace_id);
    utils::print_kv("llm calls", &result.metadata.llm_calls.len().to_string());
    utils::print_kv("tool calls", &result.metadata.tool_calls.len().to_string());
    utils::print_kv("total cost", &format!("${:.6}", result.metadata.total_cost));
    utils::print_kv("total tokens", &result.metadata.total_tokens.to_string());
    utils::print_kv("duration", &format!("{}ms", result.metadata.duration_ms));

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

async fn handle_check(tool_file: String) -> Result<()> {
    let tool = load_tool(&tool_file).await?;
    let issues = tool.config_issues();

    if issues.is_empty() {
        utils::print_success(&format!("'{}' is well-formed", tool.slug));
        return Ok(());
    }

    utils::print_error(&format!("'{}' has {} issue(s):", tool.slug, issues.len()));
    for issue in &issues {
        println!("  - {issue}");
    }
    std::process::exit(1);
}

fn handle_pricing(provider: String, model: String) -> Result<()> {
    let price = cost::price_for_model(&provider, &model);
    utils::print_header(&format!("{provider}/{model}"));
    utils::print_kv("input", &format!("${:.2} per 1M tokens", price.input_per_million));
    utils::print_kv("output", &format!("${:.2} per 1M tokens", price.output_per_million));
    Ok(())
}
