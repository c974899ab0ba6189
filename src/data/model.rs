use arrow::record_batch::RecordBatch;
use serde_json::{Map, Number, Value as JsonValue};

// ---------------------------------------------------------------------------
// Record / Table aliases
// ---------------------------------------------------------------------------

/// One input data point: field name → scalar JSON value.
pub type Record = Map<String, JsonValue>;

/// Rectangular rows × named columns representation handed to the artifacts.
pub type Table = RecordBatch;

// ---------------------------------------------------------------------------
// CellValue – a single scalar cell of a record
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the scalar JSON types.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Classify a JSON value. Arrays and objects are not scalar cells and yield `None`.
    pub fn from_json(val: &JsonValue) -> Option<Self> {
        match val {
            JsonValue::String(s) => Some(CellValue::String(s.clone())),
            JsonValue::Number(n) => Some(Self::from_number(n)),
            JsonValue::Bool(b) => Some(CellValue::Bool(*b)),
            JsonValue::Null => Some(CellValue::Null),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            CellValue::Integer(i)
        } else if let Some(u) = n.as_u64() {
            // Above i64::MAX: widened to float.
            CellValue::Float(u as f64)
        } else {
            // Not an integer, so serde_json holds a finite f64 and `as_f64` is always Some.
            CellValue::Float(n.as_f64().unwrap_or_default())
        }
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::String(_) => "string",
            CellValue::Integer(_) => "integer",
            CellValue::Float(_) => "float",
            CellValue::Bool(_) => "boolean",
            CellValue::Null => "null",
        }
    }
}

/// Describe the JSON type of an arbitrary value (for "not a mapping" errors).
pub fn json_type_name(val: &JsonValue) -> &'static str {
    match val {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
