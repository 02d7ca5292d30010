use serde::Deserialize;
use serde_json::{Number, Value};

/// A single flat record: field name to JSON value, as returned by a SQL row.
pub type Record = serde_json::Map<String, Value>;

/// The parent value that marks a record as top-level.
///
/// `null`, a missing field and `""` are interchangeable and always denote "no parent".
/// A custom marker such as `0` or `"root"` is matched in addition to those.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum RootMarker {
    #[default]
    Absent,
    Value(Value),
}

impl RootMarker {
    /// Builds a marker from a JSON value, folding absent-like values into [`RootMarker::Absent`].
    pub fn new(value: Value) -> Self {
        if is_absent(&value) {
            RootMarker::Absent
        } else {
            RootMarker::Value(value)
        }
    }

    /// Returns `true` if a record with this parent value is a top-level record.
    pub fn is_root(&self, parent: Option<&Value>) -> bool {
        match (self, parent) {
            (_, None) => true,
            (_, Some(parent)) if is_absent(parent) => true,
            (RootMarker::Absent, Some(_)) => false,
            (RootMarker::Value(marker), Some(parent)) => loose_eq(parent, marker),
        }
    }

    /// The value written as the parent of generated top-level records.
    pub fn to_value(&self) -> Value {
        match self {
            RootMarker::Absent => Value::Null,
            RootMarker::Value(v) => v.clone(),
        }
    }
}

impl From<Value> for RootMarker {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Where a traversal starts: at the roots, or below a given identifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StartValue {
    #[default]
    Root,
    Id(Value),
}

impl StartValue {
    /// Returns `true` if `parent` places a record directly below this start value.
    ///
    /// An absent-like identifier has no children, so roots are never re-entered from below.
    pub fn matches(&self, parent: Option<&Value>, root: &RootMarker) -> bool {
        match self {
            StartValue::Root => root.is_root(parent),
            StartValue::Id(id) if is_absent(id) => false,
            StartValue::Id(id) => parent.is_some_and(|parent| loose_eq(parent, id)),
        }
    }

    pub(crate) fn below(record: &Record, id_field: &str) -> Self {
        StartValue::Id(record.get(id_field).cloned().unwrap_or(Value::Null))
    }
}

impl From<Value> for StartValue {
    /// Absent-like values start at the roots; anything else starts below that identifier.
    fn from(value: Value) -> Self {
        if is_absent(&value) {
            StartValue::Root
        } else {
            StartValue::Id(value)
        }
    }
}

/// `null` and the empty string both stand for "no value".
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Compares identifier values the way SQL drivers and CSV exports mix them.
///
/// Absent-like values equal each other, numbers compare numerically, and a number equals a
/// string that parses to the same number. Anything else falls back to strict JSON equality.
///
/// Two integers compare exactly, so identifiers beyond 2^53 stay distinct. Floating-point
/// comparison is used only when one side is not an integer.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (a, b) if is_absent(a) || is_absent(b) => is_absent(a) && is_absent(b),
        (Value::Number(x), Value::Number(y)) => match (as_integer(x), as_integer(y)) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            let s = s.trim();
            match (as_integer(n), s.parse::<i128>()) {
                (Some(n), Ok(s)) => n == s,
                _ => s.parse::<f64>().ok().is_some_and(|f| n.as_f64() == Some(f)),
            }
        }
        (a, b) => a == b,
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Reads a numeric weight. Missing and non-numeric values count as zero.
pub fn weight_of(record: &Record, field: &str) -> f64 {
    let weight = match record.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or_default(),
        _ => 0.0,
    };

    if weight.is_finite() { weight } else { 0.0 }
}
