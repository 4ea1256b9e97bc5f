//! # provenance-yaml
//!
//! Reading and writing provenance-tracked configuration files.
//!
//! [`ProvenanceLoader`] parses YAML (with line and column tracking) or JSON
//! and wraps the result under a category, so that every node knows the file
//! and position it came from. [`ProvenanceDumper`] writes a wrapped tree back
//! as block YAML, optionally annotating every node with a comment describing
//! its current provenance step.
//!
//! ## Example
//!
//! ```rust
//! use provenance_core::HierarchyManager;
//! use provenance_yaml::{ProvenanceDumper, ProvenanceLoader};
//!
//! let defaults = ProvenanceLoader::new("defaults")
//!     .unwrap()
//!     .load_str("port: 5432\nhost: localhost\n", Some("defaults.yaml"))
//!     .unwrap();
//! let env = ProvenanceLoader::new("env")
//!     .unwrap()
//!     .load_str("port: 6543\n", Some("env.yaml"))
//!     .unwrap();
//!
//! let hierarchy = HierarchyManager::from_names(["defaults", "env"]).unwrap();
//! let merged = hierarchy.merge(&defaults, &env).unwrap();
//!
//! let yaml = ProvenanceDumper::default().dumps(&merged);
//! assert!(yaml.contains("port: 6543  # env.yaml:1:7 | env | merge"));
//! ```

mod dumper;
mod error;
mod loader;
mod parser;

pub use dumper::{CommentStyle, ProvenanceDumper, describe_step};
pub use error::{DumpError, LoadError};
pub use loader::ProvenanceLoader;
pub use parser::{ParsedYaml, parse_yaml};
