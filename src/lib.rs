//! Typed structure trees from loose nested data.
//!
//! ```
//! use loose_shape::{build, Key, Loose};
//!
//! let data = Loose::from(serde_json::json!([{"id": 1}, {"id": 2}]));
//! let tree = build(data).unwrap();
//! let first = tree.as_fixed_list().unwrap().get(0).unwrap();
//! assert!(first.as_map().unwrap().get(&Key::from("id")).is_some());
//! ```
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod jq_exec;
pub mod json;
pub mod logging;
pub mod loose;
pub mod outline;
pub mod path_de;
pub mod structure;

pub use builder::{build, convert, BuildOptions, StructureBuilder};
pub use error::BuildError;
pub use loose::{Key, Leaf, Loose, PairSource, Shape};
pub use structure::{FixedList, Map, Structure};
