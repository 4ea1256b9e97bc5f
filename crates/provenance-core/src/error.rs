//! Error types for wrapping, history access and merging.

use thiserror::Error;

/// Result type alias for provenance-core operations.
pub type Result<T> = std::result::Result<T, ProvenanceError>;

/// Errors that can occur while building or merging provenance trees.
///
/// Every error is raised synchronously by the call that triggers it, and no
/// operation returns a partial tree alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvenanceError {
    /// A raw value kind that cannot be wrapped (anchors, bad values,
    /// non-scalar map keys, out-of-range numbers).
    #[error("Cannot wrap {kind} at `{path}`")]
    Shape {
        /// Structural path of the offending node
        path: String,
        /// Description of the unsupported kind
        kind: String,
    },

    /// A category that is not registered in the hierarchy.
    #[error("Unknown category `{0}`")]
    UnknownCategory(String),

    /// A category name listed more than once when building a hierarchy.
    #[error("Duplicate category `{0}` in hierarchy")]
    DuplicateCategory(String),

    /// Two distinct categories were given the same priority.
    #[error("Categories `{first}` and `{second}` share priority {priority}")]
    PriorityConflict {
        first: String,
        second: String,
        priority: i64,
    },

    /// History index outside `-len..len`.
    #[error("History index {index} out of range for provenance of length {len}")]
    HistoryIndex {
        index: isize,
        len: usize,
    },

    /// A provenance step was created without a category.
    #[error("Provenance step category must not be empty")]
    EmptyCategory,

    /// A provenance history was created without any step.
    #[error("Provenance history must contain at least one step")]
    EmptyHistory,

    /// Tree nesting exceeds the configured maximum depth.
    #[error("Nesting too deep (max depth: {max_depth}) at path: {path}")]
    NestingTooDeep {
        /// Maximum allowed depth
        max_depth: usize,
        /// Path where the limit was exceeded
        path: String,
    },

    /// `merge_all` or `choose` was called without any input.
    #[error("Nothing to merge: at least one value is required")]
    NothingToMerge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProvenanceError::Shape {
            path: "a.b[0]".into(),
            kind: "YAML alias".into(),
        };
        assert_eq!(err.to_string(), "Cannot wrap YAML alias at `a.b[0]`");

        let err = ProvenanceError::HistoryIndex { index: -3, len: 2 };
        assert_eq!(
            err.to_string(),
            "History index -3 out of range for provenance of length 2"
        );

        let err = ProvenanceError::PriorityConflict {
            first: "env".into(),
            second: "user".into(),
            priority: 10,
        };
        assert_eq!(
            err.to_string(),
            "Categories `env` and `user` share priority 10"
        );
    }
}
