use crate::options::{HierarchyOptions, WeightOptions};
use crate::record::{Record, StartValue, weight_of};
use crate::tree::children_of;

/// Flattens records into CONNECT BY order.
///
/// Each record directly below `options.start` is emitted in input order, immediately followed
/// by its whole subtree. Emitted nodes carry their depth, leaf flag, 1-based sibling index and
/// dotted path index (`"1.2.3"`).
pub fn flatten_hierarchical(records: &[Record], options: &HierarchyOptions) -> Vec<Record> {
    let mut acc = Vec::with_capacity(records.len());
    flatten_hierarchical_into(records, options, &mut acc);
    acc
}

/// Same as [`flatten_hierarchical`], appending to an existing list.
pub fn flatten_hierarchical_into(
    records: &[Record],
    options: &HierarchyOptions,
    acc: &mut Vec<Record>,
) {
    tracing::debug!(records = records.len(), "flattening hierarchy");
    Walker::new(records, options, None).run(acc);
}

/// Flattens records like [`flatten_hierarchical`] and distributes weight down the hierarchy.
///
/// For every sibling group the weights are summed; each node records the group sum, its own
/// share of that sum, the share inherited from its parent and its cumulative share relative
/// to the top of the output (inherited share times own share). A group whose weights sum to
/// zero gives every member a share of `0.0`. A group whose sum exceeds the `f64` range is
/// shared out on rescaled weights and reports its sum saturated at `f64::MAX`.
pub fn flatten_weighted(
    records: &[Record],
    options: &HierarchyOptions,
    weight: &WeightOptions,
) -> Vec<Record> {
    let mut acc = Vec::with_capacity(records.len());
    flatten_weighted_into(records, options, weight, &mut acc);
    acc
}

/// Same as [`flatten_weighted`], appending to an existing list.
pub fn flatten_weighted_into(
    records: &[Record],
    options: &HierarchyOptions,
    weight: &WeightOptions,
    acc: &mut Vec<Record>,
) {
    tracing::debug!(
        records = records.len(),
        weight_field = %weight.field,
        "flattening weighted hierarchy"
    );
    Walker::new(records, options, Some(weight)).run(acc);
}

struct Walker<'a> {
    records: &'a [Record],
    options: &'a HierarchyOptions,
    weight: Option<&'a WeightOptions>,
    emitted: usize,
    exhausted: bool,
}

impl<'a> Walker<'a> {
    fn new(
        records: &'a [Record],
        options: &'a HierarchyOptions,
        weight: Option<&'a WeightOptions>,
    ) -> Self {
        Self {
            records,
            options,
            weight,
            emitted: 0,
            exhausted: false,
        }
    }

    fn run(mut self, acc: &mut Vec<Record>) {
        let options = self.options;
        let top = children_of(self.records, &options.start, options);
        let inherited = self.weight.map_or(1.0, |w| w.inherited_share);

        self.visit(top, options.depth, options.path_prefix.as_deref(), inherited, acc);
    }

    // The emitted count never exceeds the input size, which stops runaway recursion when
    // duplicate identifiers make a parent reachable from its own subtree.
    fn has_budget(&mut self) -> bool {
        if self.emitted < self.records.len() {
            return true;
        }

        if !self.exhausted {
            tracing::warn!(
                records = self.records.len(),
                "stopped flattening: more nodes than input records, parent references are cyclic"
            );
            self.exhausted = true;
        }
        false
    }

    fn visit(
        &mut self,
        group: Vec<&'a Record>,
        depth: usize,
        prefix: Option<&str>,
        inherited: f64,
        acc: &mut Vec<Record>,
    ) {
        let options = self.options;
        let meta = &options.meta;
        let shares = self.weight.map(|w| {
            let weights = group.iter().map(|r| weight_of(r, &w.field)).collect::<Vec<_>>();
            group_shares(&weights)
        });

        for (i, record) in group.into_iter().enumerate() {
            if !self.has_budget() {
                return;
            }

            let index = i + 1;
            let path = match prefix {
                Some(prefix) => format!("{prefix}.{index}"),
                None => index.to_string(),
            };
            let below = StartValue::below(record, &options.id_field);
            let children = children_of(self.records, &below, options);

            let mut node = record.clone();
            node.insert(meta.level.to_string(), depth.into());
            node.insert(meta.leaf.to_string(), children.is_empty().into());
            node.insert(meta.index.to_string(), index.into());
            node.insert(meta.path_index.to_string(), path.clone().into());

            let mut root_share = inherited;
            if let Some((shares, sum)) = &shares {
                let share = shares[i];
                root_share = finite_or_zero(inherited * share);

                node.insert(meta.weight_sum.to_string(), (*sum).into());
                node.insert(meta.weight_percent.to_string(), share.into());
                node.insert(meta.parent_weight_percent.to_string(), inherited.into());
                node.insert(meta.root_weight_percent.to_string(), root_share.into());
            }

            tracing::trace!(path = %path, depth, "emit node");
            acc.push(node);
            self.emitted += 1;

            if !children.is_empty() {
                let next = depth.saturating_add(1);
                self.visit(children, next, Some(path.as_str()), root_share, acc);
            }
        }
    }
}

/// Each weight's share of the group and the group sum.
fn group_shares(weights: &[f64]) -> (Vec<f64>, f64) {
    let sum = weights.iter().sum::<f64>();
    if sum.is_finite() {
        return (share_out(weights, sum), sum);
    }

    // Weights are finite, so the largest magnitude is a positive finite scale.
    let scale = weights.iter().fold(0.0_f64, |max, w| max.max(w.abs()));
    let scaled = weights.iter().map(|w| w / scale).collect::<Vec<_>>();
    let scaled_sum = scaled.iter().sum::<f64>();

    (share_out(&scaled, scaled_sum), (scaled_sum * scale).clamp(f64::MIN, f64::MAX))
}

fn share_out(weights: &[f64], sum: f64) -> Vec<f64> {
    weights
        .iter()
        .map(|w| if sum == 0.0 { 0.0 } else { finite_or_zero(w / sum) })
        .collect()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
