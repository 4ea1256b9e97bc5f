//! YAML parser that records the source position of every node.

use crate::error::LoadError;
use provenance_core::{NodePath, PositionMap, SourcePosition, yaml_key};
use std::collections::HashMap;
use yaml_rust2::Yaml;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Handle of the YAML core schema tags (`!!str`, `!!int`, ...).
const CORE_TAG_HANDLE: &str = "tag:yaml.org,2002:";

/// A parsed YAML document and the positions of its nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedYaml {
    pub value: Yaml,
    /// 1-indexed line and column of every node outside mapping keys
    pub positions: PositionMap,
}

/// Parse the first YAML document in `content`.
///
/// `file` is only used in error messages. Empty input parses as null.
/// Anchors are expanded in place; nodes inside an expanded alias have no
/// position of their own.
///
/// # Example
///
/// ```rust
/// use provenance_core::NodePath;
/// use provenance_yaml::parse_yaml;
///
/// let parsed = parse_yaml("name: app\nport: 8080\n", "app.yaml").unwrap();
/// let port = parsed.positions.get(&NodePath::root().key("port")).unwrap();
/// assert_eq!((port.line, port.column), (2, 7));
/// ```
pub fn parse_yaml(content: &str, file: &str) -> Result<ParsedYaml, LoadError> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = YamlBuilder::default();

    parser
        .load(&mut builder, false) // false = single document only
        .map_err(|source| LoadError::Scan {
            file: file.to_string(),
            source,
        })?;

    if let Some(message) = builder.error {
        return Err(LoadError::InvalidStructure {
            file: file.to_string(),
            message,
        });
    }

    Ok(ParsedYaml {
        value: builder.root.unwrap_or(Yaml::Null),
        positions: builder.positions,
    })
}

/// Builder that implements MarkedEventReceiver to construct a `Yaml` tree
/// and its position map.
#[derive(Default)]
struct YamlBuilder {
    /// Containers being constructed
    stack: Vec<Frame>,

    /// Completed anchored nodes by anchor id
    anchors: HashMap<usize, Yaml>,

    positions: PositionMap,

    root: Option<Yaml>,

    /// First structural problem found
    error: Option<String>,
}

/// A container being constructed during parsing.
enum Frame {
    Sequence {
        /// `None` when the container is (inside) a mapping key
        path: Option<NodePath>,
        anchor: usize,
        items: Vec<Yaml>,
    },
    Mapping {
        path: Option<NodePath>,
        anchor: usize,
        entries: yaml_rust2::yaml::Hash,
        /// Key waiting for its value
        key: Option<Yaml>,
    },
}

impl YamlBuilder {
    /// Path of the node that is about to start; `None` for mapping keys.
    fn next_path(&self) -> Option<NodePath> {
        match self.stack.last() {
            None => Some(NodePath::root()),
            Some(Frame::Sequence { path, items, .. }) => {
                path.as_ref().map(|path| path.index(items.len()))
            }
            Some(Frame::Mapping { path, key, .. }) => {
                let key = yaml_key(key.as_ref()?)?;
                path.as_ref().map(|path| path.key(key))
            }
        }
    }

    fn record_position(&mut self, marker: &Marker) -> Option<NodePath> {
        let path = self.next_path();
        if let Some(path) = &path {
            // Marker lines are 1-based, columns 0-based
            let position = SourcePosition::new(marker.line(), marker.col() + 1);
            self.positions.insert(path.clone(), position);
        }
        path
    }

    fn push_complete(&mut self, node: Yaml, anchor: usize) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }

        match self.stack.last_mut() {
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(pending) => {
                    entries.insert(pending, node);
                }
                None => *key = Some(node),
            },
        }
    }
}

impl MarkedEventReceiver for YamlBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Scalar(value, style, anchor, tag) => {
                self.record_position(&marker);
                let node = scalar_value(value, style, tag.as_ref());
                self.push_complete(node, anchor);
            }

            Event::SequenceStart(anchor, _tag) => {
                let path = self.record_position(&marker);
                self.stack.push(Frame::Sequence {
                    path,
                    anchor,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                if let Some(Frame::Sequence { anchor, items, .. }) = self.stack.pop() {
                    self.push_complete(Yaml::Array(items), anchor);
                }
            }

            Event::MappingStart(anchor, _tag) => {
                let path = self.record_position(&marker);
                self.stack.push(Frame::Mapping {
                    path,
                    anchor,
                    entries: yaml_rust2::yaml::Hash::new(),
                    key: None,
                });
            }

            Event::MappingEnd => {
                if let Some(Frame::Mapping { anchor, entries, .. }) = self.stack.pop() {
                    self.push_complete(Yaml::Hash(entries), anchor);
                }
            }

            Event::Alias(id) => {
                self.record_position(&marker);
                let node = match self.anchors.get(&id) {
                    Some(node) => node.clone(),
                    None => {
                        self.error.get_or_insert_with(|| {
                            format!("alias at line {} refers to an unknown anchor", marker.line())
                        });
                        Yaml::BadValue
                    }
                };
                self.push_complete(node, 0);
            }

            // Stream and document boundaries carry no content
            _ => {}
        }
    }
}

/// Type a scalar: quoted scalars are strings, core schema tags are honored,
/// and plain scalars use `Yaml::from_str`.
fn scalar_value(value: String, style: TScalarStyle, tag: Option<&Tag>) -> Yaml {
    if let Some(tag) = tag {
        if tag.handle == CORE_TAG_HANDLE || tag.handle == "!!" {
            return core_tagged(value, &tag.suffix);
        }
    }

    if style != TScalarStyle::Plain {
        return Yaml::String(value);
    }

    Yaml::from_str(&value)
}

fn core_tagged(value: String, suffix: &str) -> Yaml {
    match suffix {
        "int" => value.parse().map_or(Yaml::BadValue, Yaml::Integer),
        "float" => {
            let real = Yaml::Real(value);
            if real.as_f64().is_some() { real } else { Yaml::BadValue }
        }
        "bool" => match value.as_str() {
            "true" => Yaml::Boolean(true),
            "false" => Yaml::Boolean(false),
            _ => Yaml::BadValue,
        },
        "null" => match value.as_str() {
            "" | "~" | "null" => Yaml::Null,
            _ => Yaml::BadValue,
        },
        _ => Yaml::String(value),
    }
}
