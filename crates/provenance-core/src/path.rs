//! Structural paths into configuration trees.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A path from the root of a tree to one of its nodes.
///
/// Displays as `database.hosts[0].name`; the root path displays as `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// A new path one segment deeper.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// Parse the dotted form: `a.b[0].c`, `[2]`, or `$` / empty for the root.
    ///
    /// Keys are split on `.` and `[`; they cannot themselves contain those
    /// characters. Returns `None` on malformed input.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_prefix('$').unwrap_or(text);
        let mut path = NodePath::root();
        let mut rest = text;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let end = after.find(']')?;
                let index = after[..end].trim().parse().ok()?;
                path.push(PathSegment::Index(index));
                rest = &after[end + 1..];
            } else {
                let rest_key = rest.strip_prefix('.').unwrap_or(rest);
                let end = rest_key
                    .find(|c: char| c == '.' || c == '[')
                    .unwrap_or(rest_key.len());
                let key = &rest_key[..end];
                if key.is_empty() {
                    return None;
                }
                path.push(PathSegment::Key(key.to_string()));
                rest = &rest_key[end..];
            }
        }
        Some(path)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Key(_)) {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for NodePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for NodePath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = NodePath::root().key("database").key("hosts").index(0).key("name");
        assert_eq!(path.to_string(), "database.hosts[0].name");
        assert_eq!(NodePath::root().to_string(), "$");
        assert_eq!(NodePath::root().index(2).to_string(), "[2]");
    }

    #[test]
    fn test_parse() {
        let path = NodePath::parse("database.hosts[0].name").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("database".into()),
                PathSegment::Key("hosts".into()),
                PathSegment::Index(0),
                PathSegment::Key("name".into()),
            ]
        );
        assert_eq!(NodePath::parse("$").unwrap(), NodePath::root());
        assert_eq!(NodePath::parse("").unwrap(), NodePath::root());
        assert_eq!(NodePath::parse("[1][2]").unwrap().len(), 2);
    }

    #[test]
    fn test_parse_roundtrips_display() {
        for text in ["a", "a.b", "a[3]", "a[3].b.c[0]", "[0].x"] {
            assert_eq!(NodePath::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_parse_malformed() {
        assert!(NodePath::parse("a..b").is_none());
        assert!(NodePath::parse("a[x]").is_none());
        assert!(NodePath::parse("a[1").is_none());
    }
}
