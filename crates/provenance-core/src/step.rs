//! A single immutable entry in a provenance history.

use crate::error::{ProvenanceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Where a value was read from.
///
/// All parts are optional: values built in code have no file, and parsers
/// that do not track positions only supply the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path of the source file
    pub file: Option<String>,
    /// 1-indexed line
    pub line: Option<usize>,
    /// 1-indexed column
    pub column: Option<usize>,
}

impl SourceLocation {
    /// A location with only a file.
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: None,
            column: None,
        }
    }

    /// True if no part of the location is known.
    pub fn is_unknown(&self) -> bool {
        self.file.is_none() && self.line.is_none() && self.column.is_none()
    }
}

impl fmt::Display for SourceLocation {
    /// Renders as `file:line:column`, omitting the unknown parts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(file) = &self.file {
            write!(f, "{}", file)?;
            wrote = true;
        }
        for part in [self.line, self.column].into_iter().flatten() {
            if wrote {
                write!(f, ":")?;
            }
            write!(f, "{}", part)?;
            wrote = true;
        }
        Ok(())
    }
}

/// One alternative considered when a value was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChooseRecord {
    /// The alternative's current step at the time of resolution
    pub step: ProvenanceStep,
    /// The alternative's value, rendered as text
    pub value: String,
    /// Whether this alternative was the one kept
    pub selected: bool,
}

/// An immutable history entry.
///
/// Steps are assembled with the `with_*` builder methods and then handed to a
/// [`Provenance`](crate::Provenance), after which they are only reachable by
/// shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceStep {
    category: String,
    subcategory: Option<String>,
    location: SourceLocation,
    modified_by: Option<String>,
    timestamp: SystemTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    choose_history: Vec<ChooseRecord>,
}

impl ProvenanceStep {
    /// Create a step for `category`, timestamped now.
    pub fn new(category: impl Into<String>) -> Result<Self> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(ProvenanceError::EmptyCategory);
        }
        Ok(Self {
            category,
            subcategory: None,
            location: SourceLocation::default(),
            modified_by: None,
            timestamp: SystemTime::now(),
            choose_history: Vec::new(),
        })
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.location.file = Some(file.into());
        self
    }

    /// Set the 1-indexed line and column.
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.location.line = Some(line);
        self.location.column = Some(column);
        self
    }

    /// Name the operation that produced this step.
    pub fn with_modified_by(mut self, operation: impl Into<String>) -> Self {
        self.modified_by = Some(operation.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_choose_history(mut self, records: Vec<ChooseRecord>) -> Self {
        self.choose_history = records;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn file(&self) -> Option<&str> {
        self.location.file.as_deref()
    }

    pub fn line(&self) -> Option<usize> {
        self.location.line
    }

    pub fn column(&self) -> Option<usize> {
        self.location.column
    }

    pub fn modified_by(&self) -> Option<&str> {
        self.modified_by.as_deref()
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Alternatives recorded when this step resolved a conflict. Empty when
    /// no resolution took place.
    pub fn choose_history(&self) -> &[ChooseRecord] {
        &self.choose_history
    }

    /// A copy of this step's origin, stamped now as produced by `operation`.
    ///
    /// Category, subcategory and location carry over; the choose history
    /// does not.
    pub(crate) fn derive(&self, operation: &str) -> Self {
        Self {
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            location: self.location.clone(),
            modified_by: Some(operation.to_string()),
            timestamp: SystemTime::now(),
            choose_history: Vec::new(),
        }
    }

    /// A copy of this step for a child node at a different position.
    ///
    /// Keeps the timestamp so that one wrap call yields one consistent seed.
    pub(crate) fn at_position(&self, line: Option<usize>, column: Option<usize>) -> Self {
        let mut step = self.clone();
        step.modified_by = None;
        step.choose_history = Vec::new();
        step.location.line = line;
        step.location.column = column;
        step
    }
}
