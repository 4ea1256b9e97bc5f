//! Provenance tracking and hierarchical merging for configuration trees.
//!
//! This crate records, for every value in a configuration tree, where the
//! value came from and how it was overridden. It has three layers:
//!
//! - **Data model**: [`ProvenanceStep`] is one immutable history entry and
//!   [`Provenance`] is the append-only list of them.
//! - **Wrapping**: [`TypeWrapperFactory`] turns a raw tree (anything that
//!   implements [`RawTree`], such as `yaml_rust2::Yaml` or
//!   `serde_json::Value`) into a [`WrappedValue`] tree where every node owns
//!   its own provenance but otherwise behaves like the plain value.
//! - **Merging**: [`HierarchyManager`] resolves conflicts between trees by
//!   the priority of their categories, extending histories as it goes.
//!
//! The crate performs no I/O and never logs. Parsing text into raw trees and
//! dumping annotated output are left to callers.
//!
//! # Example
//!
//! ```rust
//! use provenance_core::{HierarchyManager, ProvenanceStep, TypeWrapperFactory};
//! use serde_json::json;
//!
//! let factory = TypeWrapperFactory::default();
//! let defaults = factory
//!     .wrap(&json!({"x": 1, "y": 1}), ProvenanceStep::new("defaults").unwrap())
//!     .unwrap();
//! let env = factory
//!     .wrap(&json!({"x": 2}), ProvenanceStep::new("env").unwrap())
//!     .unwrap();
//!
//! let hierarchy = HierarchyManager::from_names(["defaults", "env"]).unwrap();
//! let merged = hierarchy.merge(&defaults, &env).unwrap();
//!
//! assert_eq!(merged["x"], 2);
//! assert_eq!(merged["x"].provenance().original().category(), "defaults");
//! assert_eq!(merged["x"].provenance().current().category(), "env");
//! assert_eq!(merged["y"].provenance().len(), 1);
//! ```

mod error;
mod factory;
mod hierarchy;
mod path;
mod provenance;
mod raw;
mod scalar;
mod step;
mod traverse;
mod value;

pub use error::{ProvenanceError, Result};

pub use step::{ChooseRecord, ProvenanceStep, SourceLocation};

pub use provenance::Provenance;

pub use scalar::Scalar;

pub use value::{ValueKind, WrappedValue};

pub use path::{NodePath, PathSegment};

pub use raw::{PositionLookup, PositionMap, RawShape, RawTree, SourcePosition, yaml_key};

pub use factory::{TypeWrapperFactory, WrapOptions};

pub use hierarchy::{
    CategoryLevel,
    HierarchyConfig,
    HierarchyManager,
    MODIFIED_BY_CHOOSE,
    MODIFIED_BY_MERGE,
    MODIFIED_BY_SHADOWED,
};
