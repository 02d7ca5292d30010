//! # arbor: flat records to trees and back
//!
//! This crate moves hierarchy construction out of the database and into application code.
//! It takes the flat rows a SQL query returns, where each row points at its parent through a
//! parent-reference field, and builds hierarchical representations from them.
//!
//! ## Operations
//!
//! - **Nested tree**: [`build_tree`] attaches children to their parents.
//! - **Hierarchical order**: [`flatten_hierarchical`] lists records the way Oracle's
//!   `CONNECT BY` does, with sibling and dotted path indices (`"1.2.3"`).
//! - **Weighted order**: [`flatten_weighted`] additionally spreads a weight field down the
//!   hierarchy as per-group and cumulative shares.
//! - **Tree to flat**: [`flatten_tree_to_array`] turns a nested tree back into records with
//!   generated identifiers.
//!
//! Input records are never modified; every operation returns annotated copies.
//!
//! ## Quick Start
//!
//! ```rust
//! use arbor::{HierarchyOptions, Record, build_tree, flatten_hierarchical};
//! use serde_json::json;
//!
//! let records: Vec<Record> = serde_json::from_value(json!([
//!     {"id": 1, "parent_id": null, "name": "root"},
//!     {"id": 2, "parent_id": 1, "name": "left"},
//!     {"id": 3, "parent_id": 1, "name": "right"},
//! ]))
//! .unwrap();
//!
//! let tree = build_tree(&records, &HierarchyOptions::default());
//! assert_eq!(tree[0]["children"][1]["name"], json!("right"));
//!
//! let flat = flatten_hierarchical(&records, &HierarchyOptions::default());
//! assert_eq!(flat[2]["$path_index"], json!("1.2"));
//! ```
//!
//! ## Matching
//!
//! Parent values `null`, missing and `""` all mean "top level", and identifiers compare
//! loosely so that `1`, `1.0` and `"1"` refer to the same parent. See [`loose_eq`] and
//! [`RootMarker`] for the exact rules.
mod converter;
mod flatten;
mod input;
mod options;
mod record;
mod tree;
mod unnest;

pub use converter::{Converter, ConverterOptions};
pub use flatten::{
    flatten_hierarchical, flatten_hierarchical_into, flatten_weighted, flatten_weighted_into,
};
pub use input::{InputError, records_from_csv, records_from_json, tree_from_json};
pub use options::{HierarchyOptions, MetaFields, UnnestOptions, WeightOptions};
pub use record::{Record, RootMarker, StartValue, is_absent, loose_eq, weight_of};
pub use tree::build_tree;
pub use unnest::{IdCounter, flatten_tree_to_array};
