//! Wrapping raw parser trees into provenance-carrying trees.
//!
//! [`TypeWrapperFactory`] walks a raw tree once and gives every node its own
//! single-step [`Provenance`]. The root gets the seed step as supplied; every
//! other node gets a copy of its parent's step relocated to the node's own
//! source position.
//!
//! # Depth Limiting
//!
//! Wrapping enforces a maximum depth so that pathological input cannot
//! overflow the stack. The default limit is 256 levels.

use crate::error::{ProvenanceError, Result};
use crate::path::{NodePath, PathSegment};
use crate::provenance::Provenance;
use crate::raw::{PositionLookup, RawShape, RawTree};
use crate::step::ProvenanceStep;
use crate::value::{ValueKind, WrappedValue};
use indexmap::IndexMap;

/// Options for wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapOptions {
    /// Maximum nesting depth (default: 256).
    ///
    /// Wrapping fails with `ProvenanceError::NestingTooDeep` beyond it.
    pub max_depth: usize,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// Builds [`WrappedValue`] trees from raw trees.
///
/// The factory holds no state besides its options; one instance can wrap any
/// number of trees.
#[derive(Debug, Clone, Default)]
pub struct TypeWrapperFactory {
    options: WrapOptions,
}

struct WrapContext<'a, P: ?Sized> {
    positions: &'a P,
    options: &'a WrapOptions,
}

impl TypeWrapperFactory {
    pub fn new(options: WrapOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WrapOptions {
        &self.options
    }

    /// Wrap `raw` without any position information.
    ///
    /// Every node inherits the seed's location.
    pub fn wrap<T: RawTree>(&self, raw: &T, seed: ProvenanceStep) -> Result<WrappedValue> {
        self.wrap_with_positions(raw, seed, &())
    }

    /// Wrap `raw`, taking child positions from `positions`.
    ///
    /// A node with no recorded position keeps the position of its nearest
    /// enclosing node. Map keys are not tracked.
    pub fn wrap_with_positions<T, P>(
        &self,
        raw: &T,
        seed: ProvenanceStep,
        positions: &P,
    ) -> Result<WrappedValue>
    where
        T: RawTree,
        P: PositionLookup + ?Sized,
    {
        let ctx = WrapContext {
            positions,
            options: &self.options,
        };
        let mut path = NodePath::root();
        wrap_node(&ctx, raw, seed, &mut path, 0)
    }
}

fn wrap_node<T, P>(
    ctx: &WrapContext<'_, P>,
    raw: &T,
    step: ProvenanceStep,
    path: &mut NodePath,
    depth: usize,
) -> Result<WrappedValue>
where
    T: RawTree,
    P: PositionLookup + ?Sized,
{
    if depth > ctx.options.max_depth {
        return Err(ProvenanceError::NestingTooDeep {
            max_depth: ctx.options.max_depth,
            path: path.to_string(),
        });
    }

    let kind = match raw.shape(path)? {
        RawShape::Scalar(scalar) => ValueKind::Scalar(scalar),
        RawShape::Sequence(items) => {
            let mut wrapped = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                let child_step = child_step(ctx, &step, path);
                let child = wrap_node(ctx, item, child_step, path, depth + 1)?;
                path.pop();
                wrapped.push(child);
            }
            ValueKind::Sequence(wrapped)
        }
        RawShape::Mapping(entries) => {
            let mut wrapped = IndexMap::with_capacity(entries.len());
            for (key, value) in entries {
                if wrapped.contains_key(&key) {
                    return Err(ProvenanceError::Shape {
                        path: path.to_string(),
                        kind: format!("duplicate mapping key `{}`", key),
                    });
                }
                path.push(PathSegment::Key(key.clone()));
                let child_step = child_step(ctx, &step, path);
                let child = wrap_node(ctx, value, child_step, path, depth + 1)?;
                path.pop();
                wrapped.insert(key, child);
            }
            ValueKind::Mapping(wrapped)
        }
    };

    Ok(WrappedValue::new(kind, Provenance::new(step)))
}

fn child_step<P: PositionLookup + ?Sized>(
    ctx: &WrapContext<'_, P>,
    parent: &ProvenanceStep,
    path: &NodePath,
) -> ProvenanceStep {
    match ctx.positions.position(path) {
        Some(position) => parent.at_position(Some(position.line), Some(position.column)),
        None => parent.at_position(parent.line(), parent.column()),
    }
}

impl WrappedValue {
    /// Rebuild the plain raw tree, dropping all provenance.
    ///
    /// The inverse of [`TypeWrapperFactory::wrap`].
    pub fn unwrap_into<T: RawTree>(&self) -> T {
        match self.kind() {
            ValueKind::Scalar(scalar) => T::from_scalar(scalar),
            ValueKind::Sequence(items) => {
                T::from_sequence(items.iter().map(WrappedValue::unwrap_into).collect())
            }
            ValueKind::Mapping(entries) => T::from_mapping(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.unwrap_into()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{PositionMap, SourcePosition};
    use crate::scalar::Scalar;
    use serde_json::{Value, json};
    use yaml_rust2::{Yaml, YamlLoader};

    fn seed(category: &str) -> ProvenanceStep {
        ProvenanceStep::new(category)
            .unwrap()
            .with_subcategory("base")
            .with_file("config.yaml")
    }

    #[test]
    fn test_root_gets_seed_verbatim() {
        let seed = seed("defaults").with_modified_by("load");
        let wrapped = TypeWrapperFactory::default()
            .wrap(&json!({"a": 1}), seed.clone())
            .unwrap();

        assert_eq!(wrapped.provenance().len(), 1);
        assert_eq!(wrapped.provenance().current(), &seed);
    }

    #[test]
    fn test_children_derive_from_seed() {
        let seed = seed("defaults").with_modified_by("load");
        let wrapped = TypeWrapperFactory::default()
            .wrap(&json!({"db": {"hosts": ["a", "b"]}}), seed.clone())
            .unwrap();

        let host = &wrapped["db"]["hosts"][1];
        assert_eq!(host, "b");
        let step = host.provenance().current();
        assert_eq!(host.provenance().len(), 1);
        assert_eq!(step.category(), "defaults");
        assert_eq!(step.subcategory(), Some("base"));
        assert_eq!(step.file(), Some("config.yaml"));
        assert_eq!(step.timestamp(), seed.timestamp());
        assert_eq!(step.modified_by(), None);
    }

    #[test]
    fn test_positions_are_inherited() {
        let positions: PositionMap = [
            (NodePath::root().key("db"), SourcePosition::new(2, 1)),
            (NodePath::root().key("db").key("port"), SourcePosition::new(3, 9)),
        ]
        .into_iter()
        .collect();

        let wrapped = TypeWrapperFactory::default()
            .wrap_with_positions(
                &json!({"db": {"port": 5432, "name": "main"}}),
                seed("defaults").with_position(1, 1),
                &positions,
            )
            .unwrap();

        let port = wrapped["db"]["port"].provenance().current();
        assert_eq!((port.line(), port.column()), (Some(3), Some(9)));

        // no entry for db.name: falls back to db's position
        let name = wrapped["db"]["name"].provenance().current();
        assert_eq!((name.line(), name.column()), (Some(2), Some(1)));
    }

    #[test]
    fn test_nodes_have_independent_provenance() {
        let mut wrapped = TypeWrapperFactory::default()
            .wrap(&json!({"a": 1, "b": 2}), seed("defaults"))
            .unwrap();

        let step = ProvenanceStep::new("user").unwrap();
        wrapped.get_mut("a").unwrap().assign(10, step);

        assert_eq!(wrapped["a"], 10i64);
        assert_eq!(wrapped["a"].provenance().len(), 2);
        assert_eq!(wrapped["b"].provenance().len(), 1);
        assert_eq!(wrapped.provenance().len(), 1);
    }

    #[test]
    fn test_roundtrip_json() {
        let raw = json!({"name": "app", "ports": [80, 443], "ratio": 0.5, "debug": false, "x": null});
        let wrapped = TypeWrapperFactory::default().wrap(&raw, seed("d")).unwrap();
        assert_eq!(wrapped.unwrap_into::<Value>(), raw);
    }

    #[test]
    fn test_roundtrip_yaml() {
        let raw = YamlLoader::load_from_str("a: 1\nb: [x, 2.5, true, ~]\nc:\n  d: e\n")
            .unwrap()
            .remove(0);
        let wrapped = TypeWrapperFactory::default().wrap(&raw, seed("d")).unwrap();
        assert_eq!(wrapped.unwrap_into::<Yaml>(), raw);
    }

    #[test]
    fn test_yaml_key_collision_rejected() {
        let raw = YamlLoader::load_from_str("1: a\n\"1\": b\n").unwrap().remove(0);
        assert_eq!(raw.as_hash().map(|hash| hash.len()), Some(2));

        let err = TypeWrapperFactory::default()
            .wrap(&raw, seed("d"))
            .unwrap_err();
        assert_eq!(
            err,
            ProvenanceError::Shape {
                path: "$".into(),
                kind: "integer mapping key `1`".into(),
            }
        );
    }

    /// A raw tree that can hold repeated keys.
    #[derive(Debug, Clone, PartialEq)]
    enum Pairs {
        Leaf(Scalar),
        List(Vec<Pairs>),
        Map(Vec<(String, Pairs)>),
    }

    impl RawTree for Pairs {
        fn shape(&self, _path: &NodePath) -> crate::Result<RawShape<'_, Self>> {
            Ok(match self {
                Pairs::Leaf(scalar) => RawShape::Scalar(scalar.clone()),
                Pairs::List(items) => RawShape::Sequence(items),
                Pairs::Map(entries) => {
                    RawShape::Mapping(entries.iter().map(|(k, v)| (k.clone(), v)).collect())
                }
            })
        }

        fn from_scalar(scalar: &Scalar) -> Self {
            Pairs::Leaf(scalar.clone())
        }

        fn from_sequence(items: Vec<Self>) -> Self {
            Pairs::List(items)
        }

        fn from_mapping(entries: Vec<(String, Self)>) -> Self {
            Pairs::Map(entries)
        }
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let raw = Pairs::Map(vec![(
            "db".into(),
            Pairs::Map(vec![
                ("port".into(), Pairs::Leaf(Scalar::Integer(1))),
                ("port".into(), Pairs::Leaf(Scalar::Integer(2))),
            ]),
        )]);
        let err = TypeWrapperFactory::default()
            .wrap(&raw, seed("d"))
            .unwrap_err();
        assert_eq!(
            err,
            ProvenanceError::Shape {
                path: "db".into(),
                kind: "duplicate mapping key `port`".into(),
            }
        );

        let unique = Pairs::Map(vec![("a".into(), Pairs::List(vec![Pairs::Leaf(Scalar::Null)]))]);
        let wrapped = TypeWrapperFactory::default().wrap(&unique, seed("d")).unwrap();
        assert_eq!(wrapped.unwrap_into::<Pairs>(), unique);
    }

    #[test]
    fn test_shape_error_names_path() {
        let mut hash = yaml_rust2::yaml::Hash::new();
        hash.insert(
            Yaml::String("items".into()),
            Yaml::Array(vec![Yaml::Integer(1), Yaml::BadValue]),
        );
        let err = TypeWrapperFactory::default()
            .wrap(&Yaml::Hash(hash), seed("d"))
            .unwrap_err();

        assert_eq!(
            err,
            ProvenanceError::Shape {
                path: "items[1]".into(),
                kind: "invalid YAML value".into(),
            }
        );
    }

    #[test]
    fn test_depth_limit() {
        let factory = TypeWrapperFactory::new(WrapOptions { max_depth: 2 });
        assert!(factory.wrap(&json!({"a": {"b": 1}}), seed("d")).is_ok());

        let err = factory
            .wrap(&json!({"a": {"b": {"c": 1}}}), seed("d"))
            .unwrap_err();
        assert_eq!(
            err,
            ProvenanceError::NestingTooDeep {
                max_depth: 2,
                path: "a.b.c".into(),
            }
        );
    }
}
