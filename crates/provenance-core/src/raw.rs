//! The contract between parsers and the wrapping layer.
//!
//! A parser hands over a raw tree (anything implementing [`RawTree`]) and,
//! optionally, a [`PositionLookup`] that maps structural paths to source
//! positions. Implementations are provided for `yaml_rust2::Yaml` and
//! `serde_json::Value`.

use crate::error::{ProvenanceError, Result};
use crate::path::NodePath;
use crate::scalar::Scalar;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use yaml_rust2::Yaml;

/// A raw node classified by shape.
#[derive(Debug)]
pub enum RawShape<'a, T> {
    /// String-keyed entries in source order
    Mapping(Vec<(String, &'a T)>),
    Sequence(&'a [T]),
    Scalar(Scalar),
}

/// A raw value tree produced by a parser.
pub trait RawTree: Sized {
    /// Classify this node. Unsupported kinds fail with
    /// [`ProvenanceError::Shape`], reported at `path`.
    fn shape(&self, path: &NodePath) -> Result<RawShape<'_, Self>>;

    fn from_scalar(scalar: &Scalar) -> Self;

    fn from_sequence(items: Vec<Self>) -> Self;

    fn from_mapping(entries: Vec<(String, Self)>) -> Self;
}

/// A 1-indexed line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Source positions of raw nodes, keyed by structural path.
pub trait PositionLookup {
    fn position(&self, path: &NodePath) -> Option<SourcePosition>;
}

/// No positions at all.
impl PositionLookup for () {
    fn position(&self, _path: &NodePath) -> Option<SourcePosition> {
        None
    }
}

/// Positions recorded by a parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    positions: HashMap<NodePath, SourcePosition>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: NodePath, position: SourcePosition) {
        self.positions.insert(path, position);
    }

    pub fn get(&self, path: &NodePath) -> Option<SourcePosition> {
        self.positions.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl PositionLookup for PositionMap {
    fn position(&self, path: &NodePath) -> Option<SourcePosition> {
        self.get(path)
    }
}

impl FromIterator<(NodePath, SourcePosition)> for PositionMap {
    fn from_iter<I: IntoIterator<Item = (NodePath, SourcePosition)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

fn shape_error(path: &NodePath, kind: impl Into<String>) -> ProvenanceError {
    ProvenanceError::Shape {
        path: path.to_string(),
        kind: kind.into(),
    }
}

/// The text of a YAML mapping key.
///
/// Only string keys are representable. Integer, boolean, null and float
/// keys are refused rather than stringified, since `1` and `"1"` are
/// distinct keys in YAML but would collide as text.
pub fn yaml_key(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn yaml_kind(yaml: &Yaml) -> &'static str {
    match yaml {
        Yaml::Real(_) => "float",
        Yaml::Integer(_) => "integer",
        Yaml::String(_) => "string",
        Yaml::Boolean(_) => "boolean",
        Yaml::Array(_) => "sequence",
        Yaml::Hash(_) => "mapping",
        Yaml::Alias(_) => "YAML alias",
        Yaml::Null => "null",
        Yaml::BadValue => "invalid YAML value",
    }
}

fn non_string_key(key: &Yaml) -> String {
    match key {
        Yaml::Integer(i) => format!("integer mapping key `{}`", i),
        Yaml::Boolean(b) => format!("boolean mapping key `{}`", b),
        Yaml::Real(text) => format!("float mapping key `{}`", text),
        other => format!("{} used as a mapping key", yaml_kind(other)),
    }
}

/// Reals are written from their value, so `1e3` comes back as `1000.0`.
fn yaml_real(value: f64) -> String {
    if value.is_nan() {
        ".nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { ".inf" } else { "-.inf" }.to_string()
    } else {
        format!("{:?}", value)
    }
}

impl RawTree for Yaml {
    fn shape(&self, path: &NodePath) -> Result<RawShape<'_, Self>> {
        match self {
            Yaml::Hash(hash) => {
                let mut entries = Vec::with_capacity(hash.len());
                for (key, value) in hash {
                    let key =
                        yaml_key(key).ok_or_else(|| shape_error(path, non_string_key(key)))?;
                    entries.push((key, value));
                }
                Ok(RawShape::Mapping(entries))
            }
            Yaml::Array(items) => Ok(RawShape::Sequence(items)),
            Yaml::String(s) => Ok(RawShape::Scalar(Scalar::String(s.clone()))),
            Yaml::Integer(i) => Ok(RawShape::Scalar(Scalar::Integer(*i))),
            Yaml::Real(text) => self
                .as_f64()
                .map(|f| RawShape::Scalar(Scalar::Float(f)))
                .ok_or_else(|| shape_error(path, format!("malformed float `{}`", text))),
            Yaml::Boolean(b) => Ok(RawShape::Scalar(Scalar::Boolean(*b))),
            Yaml::Null => Ok(RawShape::Scalar(Scalar::Null)),
            Yaml::Alias(_) | Yaml::BadValue => Err(shape_error(path, yaml_kind(self))),
        }
    }

    fn from_scalar(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => Yaml::Null,
            Scalar::Boolean(b) => Yaml::Boolean(*b),
            Scalar::Integer(i) => Yaml::Integer(*i),
            Scalar::Float(f) => Yaml::Real(yaml_real(*f)),
            Scalar::String(s) => Yaml::String(s.clone()),
        }
    }

    fn from_sequence(items: Vec<Self>) -> Self {
        Yaml::Array(items)
    }

    fn from_mapping(entries: Vec<(String, Self)>) -> Self {
        let mut hash = yaml_rust2::yaml::Hash::new();
        for (key, value) in entries {
            hash.insert(Yaml::String(key), value);
        }
        Yaml::Hash(hash)
    }
}

impl RawTree for JsonValue {
    fn shape(&self, path: &NodePath) -> Result<RawShape<'_, Self>> {
        match self {
            JsonValue::Object(map) => Ok(RawShape::Mapping(
                map.iter().map(|(k, v)| (k.clone(), v)).collect(),
            )),
            JsonValue::Array(items) => Ok(RawShape::Sequence(items)),
            JsonValue::String(s) => Ok(RawShape::Scalar(Scalar::String(s.clone()))),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(RawShape::Scalar(Scalar::Integer(i)))
                } else if n.is_u64() {
                    Err(shape_error(path, format!("integer {} beyond 64-bit signed range", n)))
                } else {
                    n.as_f64()
                        .map(|f| RawShape::Scalar(Scalar::Float(f)))
                        .ok_or_else(|| shape_error(path, format!("number {}", n)))
                }
            }
            JsonValue::Bool(b) => Ok(RawShape::Scalar(Scalar::Boolean(*b))),
            JsonValue::Null => Ok(RawShape::Scalar(Scalar::Null)),
        }
    }

    /// Non-finite floats have no JSON form and become `null`.
    fn from_scalar(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => JsonValue::Null,
            Scalar::Boolean(b) => JsonValue::Bool(*b),
            Scalar::Integer(i) => JsonValue::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Scalar::String(s) => JsonValue::String(s.clone()),
        }
    }

    fn from_sequence(items: Vec<Self>) -> Self {
        JsonValue::Array(items)
    }

    fn from_mapping(entries: Vec<(String, Self)>) -> Self {
        JsonValue::Object(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> NodePath {
        NodePath::root()
    }

    #[test]
    fn test_yaml_scalar_shapes() {
        let cases = vec![
            (Yaml::String("x".into()), Scalar::from("x")),
            (Yaml::Integer(5), Scalar::from(5)),
            (Yaml::Real("2.5".into()), Scalar::from(2.5)),
            (Yaml::Boolean(true), Scalar::from(true)),
            (Yaml::Null, Scalar::Null),
        ];
        for (yaml, expected) in cases {
            match yaml.shape(&root()).unwrap() {
                RawShape::Scalar(scalar) => assert_eq!(scalar, expected),
                other => panic!("expected scalar, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_yaml_non_string_keys_rejected() {
        let mut hash = yaml_rust2::yaml::Hash::new();
        hash.insert(Yaml::Integer(1), Yaml::String("a".into()));
        hash.insert(Yaml::String("1".into()), Yaml::String("b".into()));
        let err = Yaml::Hash(hash).shape(&root().key("codes")).unwrap_err();
        assert_eq!(
            err,
            ProvenanceError::Shape {
                path: "codes".into(),
                kind: "integer mapping key `1`".into()
            }
        );

        for key in [Yaml::Boolean(true), Yaml::Null, Yaml::Real("1.5".into())] {
            let mut hash = yaml_rust2::yaml::Hash::new();
            hash.insert(key, Yaml::Null);
            assert!(Yaml::Hash(hash).shape(&root()).is_err());
        }
    }

    #[test]
    fn test_yaml_string_keys_keep_order() {
        let mut hash = yaml_rust2::yaml::Hash::new();
        hash.insert(Yaml::String("8080".into()), Yaml::String("http".into()));
        hash.insert(Yaml::String("true".into()), Yaml::Null);

        match Yaml::Hash(hash).shape(&root()).unwrap() {
            RawShape::Mapping(entries) => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["8080", "true"]);
            }
            other => panic!("expected mapping, got {:?}", other),
        }
    }

    #[test]
    fn test_yaml_unsupported_kinds() {
        let err = Yaml::Alias(1).shape(&root().key("a")).unwrap_err();
        assert_eq!(
            err,
            ProvenanceError::Shape {
                path: "a".into(),
                kind: "YAML alias".into()
            }
        );
        assert!(Yaml::BadValue.shape(&root()).is_err());
        assert!(Yaml::Real("abc".into()).shape(&root()).is_err());

        let mut hash = yaml_rust2::yaml::Hash::new();
        hash.insert(Yaml::Array(vec![]), Yaml::Null);
        assert!(Yaml::Hash(hash).shape(&root()).is_err());
    }

    #[test]
    fn test_json_shapes() {
        let value = json!({"a": [1, 2.5], "b": null});
        match value.shape(&root()).unwrap() {
            RawShape::Mapping(entries) => assert_eq!(entries.len(), 2),
            other => panic!("expected mapping, got {:?}", other),
        }
        match value["a"].shape(&root()).unwrap() {
            RawShape::Sequence(items) => assert_eq!(items.len(), 2),
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_json_u64_overflow_rejected() {
        let value = json!(u64::MAX);
        assert!(matches!(
            value.shape(&root()),
            Err(ProvenanceError::Shape { .. })
        ));
    }

    #[test]
    fn test_yaml_float_rendering() {
        assert_eq!(Yaml::from_scalar(&Scalar::from(1.0)), Yaml::Real("1.0".into()));
        assert_eq!(Yaml::from_scalar(&Scalar::Float(f64::INFINITY)), Yaml::Real(".inf".into()));
        assert_eq!(Yaml::from_scalar(&Scalar::Float(f64::NAN)), Yaml::Real(".nan".into()));
    }

    #[test]
    fn test_position_map() {
        let mut positions = PositionMap::new();
        positions.insert(root().key("a"), SourcePosition::new(2, 3));

        assert_eq!(positions.position(&root().key("a")), Some(SourcePosition::new(2, 3)));
        assert_eq!(positions.position(&root().key("b")), None);
        assert_eq!(().position(&root()), None);
    }
}
