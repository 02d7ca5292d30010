use serde_json::Value;
use smol_str::SmolStr;

use crate::flatten::{flatten_hierarchical, flatten_weighted};
use crate::options::{HierarchyOptions, MetaFields, UnnestOptions, WeightOptions};
use crate::record::{Record, RootMarker};
use crate::tree::build_tree;
use crate::unnest::{IdCounter, flatten_tree_to_array};

/// Field configuration shared by every operation of a [`Converter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterOptions {
    pub id_field: SmolStr,
    pub parent_field: SmolStr,
    pub root_marker: RootMarker,
    pub meta: MetaFields,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        let defaults = HierarchyOptions::default();
        Self {
            id_field: defaults.id_field,
            parent_field: defaults.parent_field,
            root_marker: defaults.root_marker,
            meta: defaults.meta,
        }
    }
}

/// Converts between flat records and trees with one field configuration.
///
/// A converter owns the identifier counter used by [`Converter::flatten_tree_to_array`], so
/// generated identifiers are unique across calls on the same instance until
/// [`Converter::reset_id_counter`]. Callers running conversions concurrently should give each
/// caller its own converter.
///
/// ```rust
/// use arbor::Converter;
/// use serde_json::json;
///
/// let records: Vec<arbor::Record> = serde_json::from_value(json!([
///     {"id": 1, "parent_id": null},
///     {"id": 2, "parent_id": 1},
/// ]))
/// .unwrap();
///
/// let mut converter = Converter::default();
/// let tree = converter.build_tree(&records);
/// assert_eq!(tree[0]["children"][0]["id"], json!(2));
///
/// let tree = tree.into_iter().map(serde_json::Value::Object).collect::<Vec<_>>();
/// let flat = converter.flatten_tree_to_array(&tree);
/// assert_eq!(flat[1]["$parent_id"], json!(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConverterOptions,
    counter: IdCounter,
}

impl Converter {
    pub fn new(options: ConverterOptions) -> Self {
        Self {
            options,
            counter: IdCounter::new(),
        }
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Hierarchy options starting at the roots with depth 1, ready to be adjusted.
    pub fn hierarchy_options(&self) -> HierarchyOptions {
        HierarchyOptions {
            id_field: self.options.id_field.clone(),
            parent_field: self.options.parent_field.clone(),
            root_marker: self.options.root_marker.clone(),
            meta: self.options.meta.clone(),
            ..Default::default()
        }
    }

    /// Tree-to-flat options for this converter's fields; top-level nodes get the root marker
    /// as their parent.
    pub fn unnest_options(&self) -> UnnestOptions {
        UnnestOptions {
            parent: self.options.root_marker.to_value(),
            meta: self.options.meta.clone(),
            ..Default::default()
        }
    }

    pub fn build_tree(&self, records: &[Record]) -> Vec<Record> {
        build_tree(records, &self.hierarchy_options())
    }

    pub fn flatten_hierarchical(&self, records: &[Record]) -> Vec<Record> {
        flatten_hierarchical(records, &self.hierarchy_options())
    }

    pub fn flatten_weighted(&self, records: &[Record], weight_field: &str) -> Vec<Record> {
        flatten_weighted(records, &self.hierarchy_options(), &WeightOptions::new(weight_field))
    }

    pub fn flatten_tree_to_array(&mut self, tree: &[Value]) -> Vec<Record> {
        let options = self.unnest_options();
        self.flatten_tree_to_array_with(tree, &options)
    }

    pub fn flatten_tree_to_array_with(
        &mut self,
        tree: &[Value],
        options: &UnnestOptions,
    ) -> Vec<Record> {
        flatten_tree_to_array(tree, options, &mut self.counter)
    }

    /// Restarts generated identifiers at `1`.
    pub fn reset_id_counter(&mut self) {
        self.counter.reset();
    }

    /// The most recently generated identifier.
    pub fn last_id(&self) -> u64 {
        self.counter.current()
    }
}
