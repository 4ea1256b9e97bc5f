//! Loading configuration files into wrapped trees.

use crate::error::LoadError;
use crate::parser::parse_yaml;
use provenance_core::{NodePath, ProvenanceStep, TypeWrapperFactory, WrappedValue};
use std::path::Path;

/// Loads YAML or JSON sources under one category.
///
/// Every node of a loaded tree starts with a single step carrying the
/// loader's category and subcategory, the source file, and, for YAML, the
/// node's line and column.
///
/// # Example
///
/// ```rust
/// use provenance_yaml::ProvenanceLoader;
///
/// let loader = ProvenanceLoader::new("defaults").unwrap();
/// let config = loader.load_str("db:\n  port: 5432\n", Some("defaults.yaml")).unwrap();
///
/// let step = config["db"]["port"].provenance().current();
/// assert_eq!(config["db"]["port"], 5432i64);
/// assert_eq!(step.category(), "defaults");
/// assert_eq!(step.file(), Some("defaults.yaml"));
/// assert_eq!(step.line(), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct ProvenanceLoader {
    category: String,
    subcategory: Option<String>,
    factory: TypeWrapperFactory,
}

impl ProvenanceLoader {
    /// Create a loader for `category`. Fails if the category is empty.
    pub fn new(category: impl Into<String>) -> Result<Self, LoadError> {
        let category = category.into();
        ProvenanceStep::new(category.as_str())?;
        Ok(Self {
            category,
            subcategory: None,
            factory: TypeWrapperFactory::default(),
        })
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_factory(mut self, factory: TypeWrapperFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    fn seed(&self, file: Option<&str>) -> Result<ProvenanceStep, LoadError> {
        let mut step = ProvenanceStep::new(self.category.as_str())?;
        if let Some(subcategory) = &self.subcategory {
            step = step.with_subcategory(subcategory.as_str());
        }
        if let Some(file) = file {
            step = step.with_file(file);
        }
        Ok(step)
    }

    /// Parse and wrap YAML text.
    ///
    /// `file` is recorded in every step; it does not need to exist.
    pub fn load_str(&self, content: &str, file: Option<&str>) -> Result<WrappedValue, LoadError> {
        let name = file.unwrap_or("<string>");
        let parsed = parse_yaml(content, name)?;

        let mut seed = self.seed(file)?;
        if let Some(position) = parsed.positions.get(&NodePath::root()) {
            seed = seed.with_position(position.line, position.column);
        }

        let value = self
            .factory
            .wrap_with_positions(&parsed.value, seed, &parsed.positions)?;

        tracing::debug!(
            category = %self.category,
            file = name,
            nodes = parsed.positions.len(),
            "Loaded YAML"
        );
        Ok(value)
    }

    /// Read and wrap a YAML file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<WrappedValue, LoadError> {
        let path = path.as_ref();
        let content = read_file(path)?;
        self.load_str(&content, Some(&path.display().to_string()))
    }

    /// Parse and wrap JSON text. JSON carries no positions, so every node
    /// records only the file.
    pub fn load_json_str(
        &self,
        content: &str,
        file: Option<&str>,
    ) -> Result<WrappedValue, LoadError> {
        let name = file.unwrap_or("<string>");
        let raw: serde_json::Value =
            serde_json::from_str(content).map_err(|source| LoadError::Json {
                file: name.to_string(),
                source,
            })?;

        let value = self.factory.wrap(&raw, self.seed(file)?)?;

        tracing::debug!(category = %self.category, file = name, "Loaded JSON");
        Ok(value)
    }

    /// Read and wrap a JSON file.
    pub fn load_json_file(&self, path: impl AsRef<Path>) -> Result<WrappedValue, LoadError> {
        let path = path.as_ref();
        let content = read_file(path)?;
        self.load_json_str(&content, Some(&path.display().to_string()))
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
