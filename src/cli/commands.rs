use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "toolflow")]
#[command(author, version, about = "LLM-fronted tool orchestration engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Invoke a tool definition against a task (actions run in dry-run mode)
    Invoke {
        /// Path to a JSON tool definition
        tool_file: String,

        /// Natural-language task to execute
        task: String,

        #[arg(short, long, default_value = "local")]
        tenant: String,

        /// Connection to execute downstream actions under
        #[arg(short, long)]
        connection: Option<String>,

        /// Skip persisting the execution record
        #[arg(long)]
        no_log: bool,
    },

    /// Validate a tool definition without invoking it
    Check {
        /// Path to a JSON tool definition
        tool_file: String,
    },

    /// Show the per-million-token pricing used for a model
    Pricing {
        provider: String,
        model: String,
    },
}
