//! Error types for loading and dumping.

use provenance_core::ProvenanceError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a configuration source.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax error
    #[error("YAML syntax error in {file}: {source}")]
    Scan {
        file: String,
        #[source]
        source: yaml_rust2::ScanError,
    },

    /// Well-formed YAML that cannot be represented (e.g. an undefined alias)
    #[error("Invalid YAML structure in {file}: {message}")]
    InvalidStructure { file: String, message: String },

    /// JSON syntax error
    #[error("JSON syntax error in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// The parsed tree could not be wrapped
    #[error(transparent)]
    Wrap(#[from] ProvenanceError),
}

/// Errors that can occur while writing annotated YAML.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LoadError::InvalidStructure {
            file: "a.yaml".into(),
            message: "undefined alias".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid YAML structure in a.yaml: undefined alias"
        );

        let err = LoadError::from(ProvenanceError::UnknownCategory("cli".into()));
        assert_eq!(err.to_string(), "Unknown category `cli`");

        let err = DumpError::Io {
            path: PathBuf::from("/nope/out.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "Failed to write /nope/out.yaml: missing");
    }
}
