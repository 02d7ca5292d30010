#![no_main]

use arbitrary::Arbitrary;
use arbor::{Converter, HierarchyOptions, Record, WeightOptions};
use libfuzzer_sys::fuzz_target;
use serde_json::{Value, json};
use std::collections::HashSet;

#[derive(Debug, Clone, Arbitrary)]
enum Ref {
    Missing,
    Null,
    Empty,
    Number(u8),
    Text(u8),
}

impl Ref {
    fn to_value(&self) -> Option<Value> {
        match self {
            Ref::Missing => None,
            Ref::Null => Some(Value::Null),
            Ref::Empty => Some(json!("")),
            Ref::Number(n) => Some(json!(n)),
            Ref::Text(n) => Some(json!(n.to_string())),
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct ArbitraryRow {
    id: u8,
    parent: Ref,
    weight: Option<i16>,
}

#[derive(Debug, Clone, Arbitrary)]
struct ArbitraryRows {
    rows: Vec<ArbitraryRow>,
    start: Option<u8>,
}

impl ArbitraryRows {
    fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Record::new();
                record.insert("id".to_string(), json!(row.id));
                if let Some(parent) = row.parent.to_value() {
                    record.insert("parent_id".to_string(), parent);
                }
                if let Some(weight) = row.weight {
                    record.insert("w".to_string(), json!(weight));
                }
                record
            })
            .collect()
    }
}

fuzz_target!(|input: ArbitraryRows| {
    let records = input.to_records();
    let mut options = HierarchyOptions::default();
    if let Some(start) = input.start {
        options = options.with_start(json!(start));
    }

    // Duplicate ids and cycles are allowed here: the guard bounds the output.
    let flat = arbor::flatten_hierarchical(&records, &options);
    assert!(flat.len() <= records.len());
    let weighted = arbor::flatten_weighted(&records, &options, &WeightOptions::new("w"));
    assert!(weighted.len() <= records.len());

    // Nesting has no guard, so only feed it unique ids.
    let mut seen = HashSet::new();
    let unique = records
        .into_iter()
        .filter(|record| seen.insert(record["id"].as_u64()))
        .collect::<Vec<_>>();

    let mut converter = Converter::default();
    let tree = converter
        .build_tree(&unique)
        .into_iter()
        .map(Value::Object)
        .collect::<Vec<_>>();
    let unnested = converter.flatten_tree_to_array(&tree);
    assert!(unnested.len() <= unique.len());
});
