/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Merge command implementation
 */

//! Merge command implementation.
//!
//! Loads every input, merges them in argument order under the category
//! hierarchy, and writes the result as YAML annotated with provenance.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use provenance_yaml::{CommentStyle, ProvenanceDumper};
use tracing::info;

use super::{SourceArgs, merge_sources};

/// Arguments for the merge command.
pub struct MergeArgs {
    pub sources: SourceArgs,
    pub comments: bool,
    pub leading_comments: bool,
    /// Write to this file instead of stdout
    pub output: Option<PathBuf>,
}

impl MergeArgs {
    fn dumper(&self) -> ProvenanceDumper {
        let style = if self.leading_comments {
            CommentStyle::Leading
        } else {
            CommentStyle::Trailing
        };
        ProvenanceDumper::new(self.comments).with_comment_style(style)
    }
}

/// Execute the merge command.
pub fn execute(args: MergeArgs) -> Result<()> {
    let merged = merge_sources(&args.sources)?;
    let dumper = args.dumper();

    match &args.output {
        Some(path) => {
            dumper
                .dump(&merged, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(output = %path.display(), "Wrote merged configuration");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(dumper.dumps(&merged).as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{sources, write};

    #[test]
    fn test_merge_writes_annotated_output() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = write(dir.path(), "defaults.yaml", "host: localhost\nport: 5432\n");
        let env = write(dir.path(), "env.yaml", "port: 6543\n");
        let output = dir.path().join("merged.yaml");

        execute(MergeArgs {
            sources: sources(&[("defaults", defaults.as_path()), ("env", env.as_path())]),
            comments: true,
            leading_comments: false,
            output: Some(output.clone()),
        })
        .unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let env_location = format!("{}:1:7 | env | merge", env.display());
        let defaults_location = format!("{}:1:7 | defaults", defaults.display());
        assert!(text.contains(&format!("host: localhost  # {}", defaults_location)));
        assert!(text.contains(&format!("port: 6543  # {}", env_location)));
    }

    #[test]
    fn test_merge_without_comments() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = write(dir.path(), "defaults.yaml", "a: 1\nlist: [x, y]\n");
        let user = write(dir.path(), "user.yaml", "list: [z]\nb: true\n");
        let output = dir.path().join("merged.yaml");

        execute(MergeArgs {
            sources: sources(&[("defaults", defaults.as_path()), ("user", user.as_path())]),
            comments: false,
            leading_comments: false,
            output: Some(output.clone()),
        })
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "a: 1\nlist:\n  - z\nb: true\n"
        );
    }

    #[test]
    fn test_merge_higher_category_first() {
        let dir = tempfile::tempdir().unwrap();
        let env = write(dir.path(), "env.yaml", "port: 6543\n");
        let defaults = write(dir.path(), "defaults.yaml", "port: 5432\n");
        let output = dir.path().join("merged.yaml");

        let mut sources = sources(&[("env", env.as_path()), ("defaults", defaults.as_path())]);
        sources.hierarchy = vec!["defaults".into(), "env".into()];
        execute(MergeArgs {
            sources,
            comments: false,
            leading_comments: false,
            output: Some(output.clone()),
        })
        .unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "port: 6543\n");
    }

    #[test]
    fn test_merge_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = write(dir.path(), "defaults.yaml", "a: 1\n");

        let err = execute(MergeArgs {
            sources: sources(&[("defaults", defaults.as_path())]),
            comments: true,
            leading_comments: true,
            output: Some(dir.path().join("missing/merged.yaml")),
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to write"));
    }
}
