use serde::Deserialize;
use smol_str::SmolStr;

use crate::record::{RootMarker, StartValue};

/// Names of the metadata fields written onto output nodes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetaFields {
    pub level: SmolStr,
    pub leaf: SmolStr,
    pub index: SmolStr,
    pub path_index: SmolStr,
    pub weight_sum: SmolStr,
    pub weight_percent: SmolStr,
    pub parent_weight_percent: SmolStr,
    pub root_weight_percent: SmolStr,
    pub id: SmolStr,
    pub parent_id: SmolStr,
    pub children: SmolStr,
}

impl Default for MetaFields {
    fn default() -> Self {
        Self {
            level: SmolStr::new_static("$level"),
            leaf: SmolStr::new_static("$leaf"),
            index: SmolStr::new_static("$index"),
            path_index: SmolStr::new_static("$path_index"),
            weight_sum: SmolStr::new_static("$weight_sum"),
            weight_percent: SmolStr::new_static("$weight_percent"),
            parent_weight_percent: SmolStr::new_static("$parent_weight_percent"),
            root_weight_percent: SmolStr::new_static("$root_weight_percent"),
            id: SmolStr::new_static("$id"),
            parent_id: SmolStr::new_static("$parent_id"),
            children: SmolStr::new_static("children"),
        }
    }
}

/// Options shared by the flat-to-hierarchy operations.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyOptions {
    pub id_field: SmolStr,
    pub parent_field: SmolStr,
    pub root_marker: RootMarker,
    /// Records directly below this value form the top of the output.
    pub start: StartValue,
    /// Depth assigned to the top of the output.
    pub depth: usize,
    /// Dotted path index the top-level path indices are appended to.
    pub path_prefix: Option<String>,
    pub meta: MetaFields,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            id_field: SmolStr::new_static("id"),
            parent_field: SmolStr::new_static("parent_id"),
            root_marker: RootMarker::default(),
            start: StartValue::default(),
            depth: 1,
            path_prefix: None,
            meta: MetaFields::default(),
        }
    }
}

impl HierarchyOptions {
    pub fn new(id_field: impl Into<SmolStr>, parent_field: impl Into<SmolStr>) -> Self {
        Self {
            id_field: id_field.into(),
            parent_field: parent_field.into(),
            ..Default::default()
        }
    }

    pub fn with_start(mut self, start: impl Into<StartValue>) -> Self {
        self.start = start.into();
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_root_marker(mut self, root_marker: RootMarker) -> Self {
        self.root_marker = root_marker;
        self
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightOptions {
    pub field: SmolStr,
    /// Share inherited from the parent of the top-level group.
    pub inherited_share: f64,
}

impl WeightOptions {
    pub fn new(field: impl Into<SmolStr>) -> Self {
        Self {
            field: field.into(),
            inherited_share: 1.0,
        }
    }

    pub fn with_inherited_share(mut self, share: f64) -> Self {
        self.inherited_share = share;
        self
    }
}

/// Options for turning a nested tree back into flat records.
#[derive(Debug, Clone, PartialEq)]
pub struct UnnestOptions {
    /// Parent identifier assigned to the top-level nodes.
    pub parent: serde_json::Value,
    pub depth: usize,
    pub meta: MetaFields,
}

impl Default for UnnestOptions {
    fn default() -> Self {
        Self {
            parent: serde_json::Value::Null,
            depth: 1,
            meta: MetaFields::default(),
        }
    }
}

impl UnnestOptions {
    pub fn with_children_field(mut self, field: impl Into<SmolStr>) -> Self {
        self.meta.children = field.into();
        self
    }

    pub fn with_parent(mut self, parent: serde_json::Value) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}
