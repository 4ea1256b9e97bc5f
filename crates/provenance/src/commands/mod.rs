/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Shared input handling for the provenance commands
 */

//! Command implementations for the provenance CLI.
//!
//! Both commands take the same sources: a list of `CATEGORY[/SUB]=FILE`
//! inputs merged in argument order, and an optional category hierarchy.

pub mod history;
pub mod merge;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use provenance_core::{HierarchyConfig, HierarchyManager, WrappedValue};
use provenance_yaml::ProvenanceLoader;
use serde::Deserialize;
use tracing::{debug, info};

/// One `CATEGORY[/SUBCATEGORY]=FILE` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub category: String,
    pub subcategory: Option<String>,
    pub path: PathBuf,
}

impl InputSpec {
    /// JSON inputs are recognized by extension; everything else is YAML.
    pub fn is_json(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

impl FromStr for InputSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let Some((label, path)) = s.split_once('=') else {
            return Err(format!("expected CATEGORY=FILE, got `{}`", s));
        };
        if path.is_empty() {
            return Err(format!("missing file in `{}`", s));
        }

        let (category, subcategory) = match label.split_once('/') {
            Some((category, subcategory)) if !subcategory.is_empty() => {
                (category, Some(subcategory.to_string()))
            }
            Some((category, _)) => (category, None),
            None => (label, None),
        };
        if category.trim().is_empty() {
            return Err(format!("missing category in `{}`", s));
        }

        Ok(Self {
            category: category.to_string(),
            subcategory,
            path: PathBuf::from(path),
        })
    }
}

/// Inputs and merge settings shared by every command.
#[derive(Debug, Clone)]
pub struct SourceArgs {
    pub inputs: Vec<InputSpec>,
    pub hierarchy: Vec<String>,
    pub hierarchy_file: Option<PathBuf>,
    pub shadow_audit: bool,
}

#[derive(Deserialize)]
struct HierarchyFile {
    categories: HierarchyConfig,
}

/// Build the category hierarchy: from the hierarchy file, the
/// `--hierarchy` list, or else the order in which categories first appear
/// among the inputs.
pub fn resolve_hierarchy(args: &SourceArgs) -> Result<HierarchyConfig> {
    let config = if let Some(path) = &args.hierarchy_file {
        read_hierarchy_file(path)?
    } else if !args.hierarchy.is_empty() {
        HierarchyConfig::from_names(args.hierarchy.iter().map(|name| name.trim()))
            .context("Invalid --hierarchy")?
    } else {
        let mut names: Vec<&str> = Vec::new();
        for input in &args.inputs {
            if !names.contains(&input.category.as_str()) {
                names.push(&input.category);
            }
        }
        HierarchyConfig::from_names(names)?
    };

    for input in &args.inputs {
        if !config.contains(&input.category) {
            bail!(
                "Category `{}` of input {} is not in the hierarchy",
                input.category,
                input.path.display()
            );
        }
    }

    Ok(config)
}

fn read_hierarchy_file(path: &Path) -> Result<HierarchyConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read hierarchy file {}", path.display()))?;
    let file: HierarchyFile = toml::from_str(&text)
        .with_context(|| format!("Failed to parse hierarchy file {}", path.display()))?;
    Ok(file.categories)
}

/// Load every input under its category.
pub fn load_inputs(inputs: &[InputSpec]) -> Result<Vec<WrappedValue>> {
    inputs
        .iter()
        .map(|input| {
            let mut loader = ProvenanceLoader::new(input.category.as_str())?;
            if let Some(subcategory) = &input.subcategory {
                loader = loader.with_subcategory(subcategory.as_str());
            }
            let value = if input.is_json() {
                loader.load_json_file(&input.path)
            } else {
                loader.load_file(&input.path)
            };
            debug!(category = %input.category, path = %input.path.display(), "Loaded input");
            value.with_context(|| format!("Failed to load {}", input.path.display()))
        })
        .collect()
}

/// Load and merge all inputs in argument order.
pub fn merge_sources(args: &SourceArgs) -> Result<WrappedValue> {
    if args.inputs.is_empty() {
        bail!("At least one input is required");
    }

    let config = resolve_hierarchy(args)?;
    let manager = HierarchyManager::new(config).with_shadow_audit(args.shadow_audit);
    let values = load_inputs(&args.inputs)?;
    let merged = manager
        .merge_all(values.iter())
        .context("Failed to merge inputs")?;

    info!(
        inputs = values.len(),
        categories = manager.config().levels().len(),
        "Merged configuration"
    );
    Ok(merged)
}
