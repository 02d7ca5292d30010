use arbor::{
    Converter, ConverterOptions, HierarchyOptions, Record, RootMarker, WeightOptions, build_tree,
    flatten_hierarchical, flatten_weighted, records_from_csv,
};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn departments() -> Vec<Record> {
    serde_json::from_value(json!([
        {"id": 1, "parent_id": null, "w": 100},
        {"id": 2, "parent_id": 1, "w": 60},
        {"id": 3, "parent_id": 1, "w": 40},
    ]))
    .unwrap()
}

fn to_value(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}

#[rstest]
fn test_build_tree_scenario(departments: Vec<Record>) {
    let tree = build_tree(&departments, &HierarchyOptions::new("id", "parent_id"));

    assert_eq!(
        to_value(tree),
        json!([{
            "id": 1, "parent_id": null, "w": 100, "$level": 1, "$leaf": false,
            "children": [
                {"id": 2, "parent_id": 1, "w": 60, "$level": 2, "$leaf": true},
                {"id": 3, "parent_id": 1, "w": 40, "$level": 2, "$leaf": true},
            ]
        }])
    );
}

#[rstest]
fn test_flatten_weighted_scenario(departments: Vec<Record>) {
    let weight = WeightOptions::new("w");
    let flat = flatten_weighted(&departments, &HierarchyOptions::default(), &weight);

    assert_eq!(flat[1]["$weight_percent"], json!(0.6));
    assert_eq!(flat[2]["$weight_percent"], json!(0.4));
    assert_eq!(flat[1]["$root_weight_percent"], flat[1]["$weight_percent"]);
    assert_eq!(flat[2]["$root_weight_percent"], flat[2]["$weight_percent"]);
    assert_eq!(flat[1]["$weight_sum"], json!(100.0));
    assert_eq!(flat[1]["$parent_weight_percent"], json!(1.0));
}

#[rstest]
fn test_nest_then_unnest_round_trip(departments: Vec<Record>) {
    let mut converter = Converter::default();
    let tree = converter
        .build_tree(&departments)
        .into_iter()
        .map(Value::Object)
        .collect::<Vec<_>>();

    let flat = converter.flatten_tree_to_array(&tree);

    assert_eq!(
        flat.iter()
            .map(|n| (n["id"].clone(), n["$id"].clone(), n["$parent_id"].clone()))
            .collect::<Vec<_>>(),
        vec![
            (json!(1), json!(1), json!(null)),
            (json!(2), json!(2), json!(1)),
            (json!(3), json!(3), json!(1)),
        ]
    );
    assert!(flat.iter().all(|n| !n.contains_key("children")));
}

#[rstest]
fn test_unnest_ids_continue_across_calls(departments: Vec<Record>) {
    let mut converter = Converter::default();
    let tree = converter
        .build_tree(&departments)
        .into_iter()
        .map(Value::Object)
        .collect::<Vec<_>>();

    let first = converter.flatten_tree_to_array(&tree);
    let second = converter.flatten_tree_to_array(&tree);

    assert_eq!(first.last().unwrap()["$id"], json!(3));
    assert_eq!(second[0]["$id"], json!(4));
    assert_eq!(second[1]["$parent_id"], json!(4));

    converter.reset_id_counter();
    let single = converter.flatten_tree_to_array(&[json!({"name": "only"})]);
    assert_eq!(single[0]["$id"], json!(1));
}

#[test]
fn test_csv_rows_build_same_tree_as_json() {
    let csv = "id,parent_id,name\n1,,Engineering\n2,1,Platform\n3,2,Storage\n4,1,Product\n";
    let json_records: Vec<Record> = serde_json::from_value(json!([
        {"id": 1, "parent_id": null, "name": "Engineering"},
        {"id": 2, "parent_id": 1, "name": "Platform"},
        {"id": 3, "parent_id": 2, "name": "Storage"},
        {"id": 4, "parent_id": 1, "name": "Product"},
    ]))
    .unwrap();

    let csv_records = records_from_csv(csv.as_bytes()).unwrap();
    let from_csv = flatten_hierarchical(&csv_records, &HierarchyOptions::default());
    let from_json = flatten_hierarchical(&json_records, &HierarchyOptions::default());

    let paths = |records: &[Record]| {
        records
            .iter()
            .map(|r| (r["name"].clone(), r["$path_index"].clone(), r["$leaf"].clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(paths(&from_csv), paths(&from_json));
    assert_eq!(from_csv[2]["$path_index"], json!("1.1.1"));
}

#[rstest]
#[case::zero(json!(0), json!([{"id": 1, "parent_id": 0}, {"id": 2, "parent_id": 1}]))]
#[case::string(
    json!("ROOT"),
    json!([{"id": "a", "parent_id": "ROOT"}, {"id": "b", "parent_id": "a"}])
)]
#[case::mixed_absent(json!(0), json!([{"id": 1}, {"id": 2, "parent_id": 1}]))]
fn test_custom_root_marker(#[case] marker: Value, #[case] data: Value) {
    let records: Vec<Record> = serde_json::from_value(data).unwrap();
    let converter = Converter::new(ConverterOptions {
        root_marker: RootMarker::new(marker),
        ..Default::default()
    });

    let flat = converter.flatten_hierarchical(&records);

    assert_eq!(flat.len(), 2);
    assert_eq!(flat[1]["$path_index"], json!("1.1"));
}

#[test]
fn test_subtree_can_be_stacked_into_one_list() {
    let records: Vec<Record> = serde_json::from_value(json!([
        {"id": 1}, {"id": 2, "parent_id": 1}, {"id": 3}, {"id": 4, "parent_id": 3},
    ]))
    .unwrap();
    let mut acc = Vec::new();

    for (prefix, start) in [("1", 1), ("2", 3)] {
        let options = HierarchyOptions::default()
            .with_start(json!(start))
            .with_depth(2)
            .with_path_prefix(prefix);
        arbor::flatten_hierarchical_into(&records, &options, &mut acc);
    }

    assert_eq!(
        acc.iter().map(|r| r["$path_index"].clone()).collect::<Vec<_>>(),
        vec![json!("1.1"), json!("2.1")]
    );
}
