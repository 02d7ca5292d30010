use serde_json::Value;

use crate::options::HierarchyOptions;
use crate::record::{Record, StartValue};

/// Builds a nested tree from flat records.
///
/// Every record directly below `options.start` becomes a top-level node. Each node is a copy
/// of its record annotated with its depth and leaf flag; non-leaf nodes carry their children,
/// in input order, under the configured children field. Returns an empty list when nothing
/// matches the start value.
///
/// Parent references are followed without a cycle check, so a cycle reachable from the start
/// value recurses until the stack is exhausted.
pub fn build_tree(records: &[Record], options: &HierarchyOptions) -> Vec<Record> {
    tracing::debug!(
        records = records.len(),
        depth = options.depth,
        "building nested tree"
    );
    nest(records, &options.start, options.depth, options)
}

pub(crate) fn children_of<'a>(
    records: &'a [Record],
    start: &StartValue,
    options: &HierarchyOptions,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| {
            start.matches(
                record.get(options.parent_field.as_str()),
                &options.root_marker,
            )
        })
        .collect()
}

fn nest(
    records: &[Record],
    start: &StartValue,
    depth: usize,
    options: &HierarchyOptions,
) -> Vec<Record> {
    let meta = &options.meta;

    children_of(records, start, options)
        .into_iter()
        .map(|record| {
            let below = StartValue::below(record, &options.id_field);
            let children = nest(records, &below, depth.saturating_add(1), options);
            let mut node = record.clone();

            node.insert(meta.level.to_string(), depth.into());
            node.insert(meta.leaf.to_string(), children.is_empty().into());
            if children.is_empty() {
                node.shift_remove(meta.children.as_str());
            } else {
                node.insert(
                    meta.children.to_string(),
                    Value::Array(children.into_iter().map(Value::Object).collect()),
                );
            }

            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_tree_single_root() {
        let data = records(json!([
            {"id": 1, "parent_id": null},
            {"id": 2, "parent_id": 1},
            {"id": 3, "parent_id": 1},
        ]));

        let tree = build_tree(&data, &HierarchyOptions::default());

        assert_eq!(
            Value::Array(tree.into_iter().map(Value::Object).collect()),
            json!([{
                "id": 1,
                "parent_id": null,
                "$level": 1,
                "$leaf": false,
                "children": [
                    {"id": 2, "parent_id": 1, "$level": 2, "$leaf": true},
                    {"id": 3, "parent_id": 1, "$level": 2, "$leaf": true},
                ]
            }])
        );
    }

    #[test]
    fn test_build_tree_does_not_touch_input() {
        let data = records(json!([{"id": 1}, {"id": 2, "parent_id": 1}]));
        let before = data.clone();

        let _ = build_tree(&data, &HierarchyOptions::default());

        assert_eq!(data, before);
    }

    #[rstest]
    #[case::empty_input(json!([]))]
    #[case::no_roots(json!([{"id": 1, "parent_id": 2}, {"id": 2, "parent_id": 1}]))]
    fn test_build_tree_without_roots_is_empty(#[case] data: Value) {
        assert!(build_tree(&records(data), &HierarchyOptions::default()).is_empty());
    }

    #[rstest]
    #[case::null(json!(null))]
    #[case::empty_string(json!(""))]
    fn test_build_tree_absent_like_parents_are_roots(#[case] parent: Value) {
        let data = records(json!([{"id": "a", "parent_id": parent}, {"id": "b"}]));

        let tree = build_tree(&data, &HierarchyOptions::default());

        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|node| node["$leaf"] == json!(true)));
    }

    #[test]
    fn test_build_tree_from_start_value() {
        let data = records(json!([
            {"id": 1},
            {"id": 2, "parent_id": 1},
            {"id": 3, "parent_id": 2},
            {"id": 4, "parent_id": 1},
        ]));

        let options = HierarchyOptions::default().with_start(json!(2)).with_depth(5);

        let tree = build_tree(&data, &options);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0]["id"], json!(3));
        assert_eq!(tree[0]["$level"], json!(5));
        assert_eq!(tree[0]["$leaf"], json!(true));
    }

    #[test]
    fn test_build_tree_with_custom_root_marker() {
        let data = records(json!([
            {"id": 1, "parent_id": 0},
            {"id": 2, "parent_id": 1},
            {"id": 3, "parent_id": null},
        ]));
        let options = HierarchyOptions::default().with_root_marker(json!(0).into());

        let tree = build_tree(&data, &options);

        assert_eq!(
            tree.iter().map(|n| n["id"].clone()).collect::<Vec<_>>(),
            vec![json!(1), json!(3)]
        );
        assert_eq!(tree[0]["children"][0]["id"], json!(2));
    }

    #[test]
    fn test_build_tree_matches_string_and_number_ids() {
        let data = records(json!([
            {"id": "10", "parent_id": ""},
            {"id": 11, "parent_id": 10},
            {"id": "12", "parent_id": "11"},
        ]));

        let tree = build_tree(&data, &HierarchyOptions::default());

        assert_eq!(tree[0]["children"][0]["children"][0]["id"], json!("12"));
        assert_eq!(tree[0]["children"][0]["children"][0]["$level"], json!(3));
    }

    #[test]
    fn test_build_tree_record_without_id_is_leaf() {
        let data = records(json!([{"name": "orphan"}, {"id": 1, "parent_id": null}]));

        let tree = build_tree(&data, &HierarchyOptions::default());

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0]["$leaf"], json!(true));
    }

    #[test]
    fn test_build_tree_custom_field_names() {
        let data = records(json!([
            {"key": "root"},
            {"key": "child", "up": "root"},
        ]));
        let mut options = HierarchyOptions::new("key", "up");
        options.meta.children = "nodes".into();
        options.meta.level = "depth".into();

        let tree = build_tree(&data, &options);

        assert_eq!(tree[0]["depth"], json!(1));
        assert_eq!(tree[0]["nodes"][0]["key"], json!("child"));
        assert_eq!(tree[0]["nodes"][0]["depth"], json!(2));
    }

    #[rstest]
    #[case::null(json!(null))]
    #[case::empty_string(json!(""))]
    fn test_build_tree_absent_start_is_root(#[case] start: Value) {
        let data = records(json!([{"id": 1}, {"id": 2, "parent_id": 1}]));

        let tree = build_tree(&data, &HierarchyOptions::default().with_start(start));

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0]["children"][0]["id"], json!(2));
    }

    #[test]
    fn test_build_tree_large_integer_ids_stay_distinct() {
        let data = records(json!([
            {"id": 9007199254740992u64, "name": "a"},
            {"id": 9007199254740993u64, "name": "b"},
            {"id": 5, "parent_id": 9007199254740993u64, "name": "child_of_b"},
        ]));

        let tree = build_tree(&data, &HierarchyOptions::default());

        assert_eq!(tree[0]["$leaf"], json!(true));
        assert!(!tree[0].contains_key("children"));
        assert_eq!(tree[1]["children"][0]["name"], json!("child_of_b"));
    }

    #[test]
    fn test_build_tree_depth_saturates() {
        let data = records(json!([{"id": 1}, {"id": 2, "parent_id": 1}]));

        let tree = build_tree(&data, &HierarchyOptions::default().with_depth(usize::MAX));

        assert_eq!(tree[0]["$level"], json!(usize::MAX));
        assert_eq!(tree[0]["children"][0]["$level"], json!(usize::MAX));
    }
}
