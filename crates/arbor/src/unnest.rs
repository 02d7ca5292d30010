use serde_json::Value;

use crate::options::UnnestOptions;
use crate::record::Record;

/// Source of generated identifiers for [`flatten_tree_to_array`].
///
/// The counter keeps counting across calls so identifiers stay unique until it is reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdCounter(u64);

impl IdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the counter and returns the new identifier. The first identifier is `1`.
    pub fn next_id(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// The most recently issued identifier, `0` if none was issued since the last reset.
    pub fn current(&self) -> u64 {
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Turns a nested tree back into flat records.
///
/// Nodes are emitted in pre-order. Each output record is a copy of its node without the
/// children field, plus a generated identifier taken from `counter`, the generated identifier
/// of its parent (`options.parent` for top-level nodes) and its depth. The input tree is left
/// untouched. Elements that are not JSON objects are skipped, and a children value that is not
/// an array counts as no children.
pub fn flatten_tree_to_array(
    tree: &[Value],
    options: &UnnestOptions,
    counter: &mut IdCounter,
) -> Vec<Record> {
    tracing::debug!(roots = tree.len(), first_id = counter.current() + 1, "flattening tree");

    let mut acc = Vec::new();
    unnest(tree, &options.parent, options.depth, options, counter, &mut acc);
    acc
}

fn unnest(
    nodes: &[Value],
    parent: &Value,
    depth: usize,
    options: &UnnestOptions,
    counter: &mut IdCounter,
    acc: &mut Vec<Record>,
) {
    let meta = &options.meta;

    for node in nodes {
        let Value::Object(node) = node else {
            tracing::debug!(?node, "skipping non-object tree node");
            continue;
        };

        let id = counter.next_id();
        let mut flat = node
            .iter()
            .filter(|(key, _)| key.as_str() != meta.children.as_str())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<Record>();

        flat.insert(meta.id.to_string(), id.into());
        flat.insert(meta.parent_id.to_string(), parent.clone());
        flat.insert(meta.level.to_string(), depth.into());
        acc.push(flat);

        if let Some(Value::Array(children)) = node.get(meta.children.as_str()) {
            let next = depth.saturating_add(1);
            unnest(children, &Value::from(id), next, options, counter, acc);
        }
    }
}
