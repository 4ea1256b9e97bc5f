//! Provenance CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{InputSpec, SourceArgs};

#[derive(Parser)]
#[command(name = "provenance")]
#[command(version)]
#[command(about = "Merge layered configuration and trace where every value came from", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge configuration files in order and write annotated YAML
    Merge {
        /// Input as CATEGORY[/SUBCATEGORY]=FILE (repeatable, merged in order)
        #[arg(short = 'i', long = "input", required = true, value_name = "CATEGORY=FILE")]
        inputs: Vec<InputSpec>,

        /// Category names from lowest to highest priority
        #[arg(long, value_delimiter = ',', conflicts_with = "hierarchy_file")]
        hierarchy: Vec<String>,

        /// TOML file with `[[categories]]` tables of `name` and `priority`
        #[arg(long, value_name = "FILE")]
        hierarchy_file: Option<PathBuf>,

        /// Do not annotate values with provenance comments
        #[arg(long)]
        no_comments: bool,

        /// Put provenance comments on their own line above each value
        #[arg(long)]
        leading_comments: bool,

        /// Do not record a "shadowed" step when a lower category loses
        #[arg(long)]
        no_shadow_audit: bool,

        /// Write output to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Print the full history of one value of the merged configuration
    History {
        /// Dotted path of the value, e.g. `server.hosts[0]`
        path: String,

        /// Input as CATEGORY[/SUBCATEGORY]=FILE (repeatable, merged in order)
        #[arg(short = 'i', long = "input", required = true, value_name = "CATEGORY=FILE")]
        inputs: Vec<InputSpec>,

        /// Category names from lowest to highest priority
        #[arg(long, value_delimiter = ',', conflicts_with = "hierarchy_file")]
        hierarchy: Vec<String>,

        /// TOML file with `[[categories]]` tables of `name` and `priority`
        #[arg(long, value_name = "FILE")]
        hierarchy_file: Option<PathBuf>,

        /// Do not record a "shadowed" step when a lower category loses
        #[arg(long)]
        no_shadow_audit: bool,

        /// Print the history as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provenance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            inputs,
            hierarchy,
            hierarchy_file,
            no_comments,
            leading_comments,
            no_shadow_audit,
            output,
        } => commands::merge::execute(commands::merge::MergeArgs {
            sources: SourceArgs {
                inputs,
                hierarchy,
                hierarchy_file,
                shadow_audit: !no_shadow_audit,
            },
            comments: !no_comments,
            leading_comments,
            output,
        }),
        Commands::History {
            path,
            inputs,
            hierarchy,
            hierarchy_file,
            no_shadow_audit,
            json,
        } => commands::history::execute(commands::history::HistoryArgs {
            sources: SourceArgs {
                inputs,
                hierarchy,
                hierarchy_file,
                shadow_audit: !no_shadow_audit,
            },
            path,
            json,
        }),
    }
}
