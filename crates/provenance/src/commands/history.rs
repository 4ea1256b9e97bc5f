/*
 * history.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * History command implementation
 */

//! History command implementation.
//!
//! Prints every provenance step recorded for one value of the merged
//! configuration, oldest first.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result, bail};
use provenance_core::WrappedValue;
use provenance_yaml::describe_step;

use super::{SourceArgs, merge_sources};

/// Arguments for the history command.
pub struct HistoryArgs {
    pub sources: SourceArgs,
    /// Dotted path, e.g. `server.hosts[0]`; empty for the root
    pub path: String,
    pub json: bool,
}

/// Execute the history command.
pub fn execute(args: HistoryArgs) -> Result<()> {
    let merged = merge_sources(&args.sources)?;
    let report = render(&merged, &args.path, args.json)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(report.as_bytes())
        .context("Failed to write to stdout")?;
    Ok(())
}

fn render(merged: &WrappedValue, path: &str, json: bool) -> Result<String> {
    let Some(node) = merged.lookup(path) else {
        bail!("No value at path `{}`", path);
    };

    if json {
        let mut text = serde_json::to_string_pretty(node.provenance())
            .context("Failed to serialize history")?;
        text.push('\n');
        return Ok(text);
    }

    Ok(format_history(path, node))
}

/// Plain-text history: the value, then one numbered line per step. Steps
/// produced by a choice list every alternative below them.
fn format_history(path: &str, node: &WrappedValue) -> String {
    let label = if path.is_empty() { "<root>" } else { path };
    let mut out = String::new();
    let _ = writeln!(out, "{} = {}", label, node);

    for (i, step) in node.provenance().iter().enumerate() {
        let _ = writeln!(out, "  [{}] {}", i, describe_step(step));
        for record in step.choose_history() {
            let marker = if record.selected { '*' } else { '-' };
            let _ = writeln!(
                out,
                "        {} {} ({})",
                marker,
                record.value,
                describe_step(&record.step)
            );
        }
    }
    out
}
