use std::io;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::record::Record;

#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    #[error("Invalid JSON input: {0}")]
    #[diagnostic(code(arbor::input::json), help("The input must be a JSON document."))]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of records")]
    #[diagnostic(
        code(arbor::input::not_an_array),
        help("Wrap the records in `[...]`, one object per row.")
    )]
    NotAnArray,

    #[error("Element {index} of the input array is not a JSON object")]
    #[diagnostic(code(arbor::input::not_an_object), help("Every record must be a JSON object."))]
    NotAnObject { index: usize },

    #[error("Invalid CSV input: {0}")]
    #[diagnostic(
        code(arbor::input::csv),
        help("The first CSV row must hold the column names.")
    )]
    Csv(#[from] csv::Error),
}

/// Parses a JSON array of objects into records.
pub fn records_from_json(input: &str) -> Result<Vec<Record>, InputError> {
    let Value::Array(values) = serde_json::from_str::<Value>(input)? else {
        return Err(InputError::NotAnArray);
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(record) => Ok(record),
            _ => Err(InputError::NotAnObject { index }),
        })
        .collect()
}

/// Parses a nested tree. A single top-level object is treated as a one-node forest.
pub fn tree_from_json(input: &str) -> Result<Vec<Value>, InputError> {
    match serde_json::from_str::<Value>(input)? {
        Value::Array(nodes) => Ok(nodes),
        node @ Value::Object(_) => Ok(vec![node]),
        _ => Err(InputError::NotAnArray),
    }
}

/// Reads CSV rows into records keyed by the header row. Every cell becomes a JSON string,
/// so an empty parent cell denotes a top-level record.
pub fn records_from_csv(reader: impl io::Read) -> Result<Vec<Record>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    reader
        .records()
        .map(|row| -> Result<Record, InputError> {
            let row = row?;
            Ok(headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.to_string(), Value::String(cell.to_string())))
                .collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_records_from_json() {
        let records = records_from_json(r#"[{"id": 1}, {"id": 2, "parent_id": 1}]"#).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["parent_id"], json!(1));
    }

    #[rstest]
    #[case::object(r#"{"id": 1}"#)]
    #[case::number("42")]
    fn test_records_from_json_not_an_array(#[case] input: &str) {
        assert!(matches!(records_from_json(input), Err(InputError::NotAnArray)));
    }

    #[test]
    fn test_records_from_json_not_an_object() {
        assert!(matches!(
            records_from_json(r#"[{"id": 1}, 2]"#),
            Err(InputError::NotAnObject { index: 1 })
        ));
    }

    #[test]
    fn test_records_from_json_invalid() {
        assert!(matches!(records_from_json("[{"), Err(InputError::Json(_))));
    }

    #[rstest]
    #[case::forest(r#"[{"name": "a"}, {"name": "b"}]"#, 2)]
    #[case::single_root(r#"{"name": "a", "children": [{"name": "b"}]}"#, 1)]
    fn test_tree_from_json(#[case] input: &str, #[case] expected: usize) {
        assert_eq!(tree_from_json(input).unwrap().len(), expected);
    }

    #[test]
    fn test_records_from_csv() {
        let csv = "id,parent_id,name\n1,,root\n2,1, child \n";

        let records = records_from_csv(csv.as_bytes()).unwrap();

        assert_eq!(
            Value::Array(records.into_iter().map(Value::Object).collect()),
            json!([
                {"id": "1", "parent_id": "", "name": "root"},
                {"id": "2", "parent_id": "1", "name": "child"},
            ])
        );
    }

    #[test]
    fn test_records_from_csv_ragged_row() {
        let csv = "id,parent_id\n1\n";

        assert!(matches!(records_from_csv(csv.as_bytes()), Err(InputError::Csv(_))));
    }
}
