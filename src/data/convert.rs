use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, NullArray, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::Value as JsonValue;

use super::model::{json_type_name, CellValue, Record, Table};
use crate::error::ConversionError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Convert an ordered batch of JSON records into a [`Table`].
///
/// * Every element must be a JSON object; its keys are column names.
/// * Columns are the union of all keys in first-seen order.
/// * A record that lacks a column gets a null cell there.
/// * Each column is typed from its non-null cells (bool, int64, float64, utf8);
///   incompatible mixes such as strings and numbers are rejected.
pub fn records_to_table(records: &[JsonValue]) -> Result<Table, ConversionError> {
    if records.is_empty() {
        return Err(ConversionError::Empty);
    }

    let mut objects: Vec<&Record> = Vec::with_capacity(records.len());
    for (index, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| ConversionError::NotAMapping {
            index,
            found: json_type_name(rec),
        })?;
        objects.push(obj);
    }

    // First-seen column order across all records.
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for obj in &objects {
        for key in obj.keys() {
            if seen.insert(key.as_str()) {
                names.push(key.clone());
            }
        }
    }

    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let mut cells = Vec::with_capacity(objects.len());
        for (row, obj) in objects.iter().enumerate() {
            let cell = match obj.get(&name) {
                None => CellValue::Null,
                Some(val) => CellValue::from_json(val).ok_or_else(|| {
                    ConversionError::NestedValue {
                        row,
                        column: name.clone(),
                    }
                })?,
            };
            cells.push(cell);
        }
        columns.push((name, cells));
    }

    columns_to_table(columns, objects.len())
}

// ---------------------------------------------------------------------------
// Column typing
// ---------------------------------------------------------------------------

/// Arrow type chosen for a column after looking at all of its non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    /// No non-null cell at all.
    Null,
    Bool,
    Int,
    /// Floats, or integers mixed with floats.
    Float,
    Utf8,
}

impl ColumnKind {
    fn of(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Null => None,
            CellValue::Bool(_) => Some(ColumnKind::Bool),
            CellValue::Integer(_) => Some(ColumnKind::Int),
            CellValue::Float(_) => Some(ColumnKind::Float),
            CellValue::String(_) => Some(ColumnKind::Utf8),
        }
    }

    fn data_type(self) -> DataType {
        match self {
            ColumnKind::Null => DataType::Null,
            ColumnKind::Bool => DataType::Boolean,
            ColumnKind::Int => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Utf8 => DataType::Utf8,
        }
    }
}

fn infer_kind(column: &str, cells: &[CellValue]) -> Result<ColumnKind, ConversionError> {
    let mut kind = ColumnKind::Null;
    let mut first: Option<&CellValue> = None;

    for cell in cells {
        let Some(next) = ColumnKind::of(cell) else {
            continue;
        };
        kind = match (kind, next) {
            (ColumnKind::Null, k) => k,
            (a, b) if a == b => a,
            (ColumnKind::Int, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => {
                return Err(ConversionError::MixedTypes {
                    column: column.to_string(),
                    first: first.map(CellValue::type_name).unwrap_or("null"),
                    other: cell.type_name(),
                })
            }
        };
        first.get_or_insert(cell);
    }

    Ok(kind)
}

fn build_array(kind: ColumnKind, cells: &[CellValue]) -> ArrayRef {
    match kind {
        ColumnKind::Null => Arc::new(NullArray::new(cells.len())),
        ColumnKind::Bool => Arc::new(BooleanArray::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnKind::Int => Arc::new(Int64Array::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnKind::Float => Arc::new(Float64Array::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::Integer(i) => Some(*i as f64),
                    CellValue::Float(f) => Some(*f),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnKind::Utf8 => Arc::new(StringArray::from(
            cells
                .iter()
                .map(|c| match c {
                    CellValue::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
    }
}

/// Assemble typed columns (name, cells) into a table with `num_rows` rows.
///
/// Every cell vector must hold exactly `num_rows` entries.
pub(crate) fn columns_to_table(
    columns: Vec<(String, Vec<CellValue>)>,
    num_rows: usize,
) -> Result<Table, ConversionError> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays = Vec::with_capacity(columns.len());

    for (name, cells) in &columns {
        let kind = infer_kind(name, cells)?;
        fields.push(Field::new(name.as_str(), kind.data_type(), true));
        arrays.push(build_array(kind, cells));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::{Float64Type, Int64Type};
    use serde_json::json;

    fn rows(v: JsonValue) -> Vec<JsonValue> {
        v.as_array().unwrap().clone()
    }

    #[test]
    fn builds_rectangular_table() {
        let table = records_to_table(&rows(json!([
            {"x": 1, "y": 2.5, "name": "a", "ok": true},
            {"x": 3, "y": 4, "name": "b", "ok": false},
        ])))
        .unwrap();

        assert_eq!(table.num_rows(), 2);
        let schema = table.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, ["x", "y", "name", "ok"]);
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(3).data_type(), &DataType::Boolean);

        let y = table.column(1).as_primitive::<Float64Type>();
        assert_eq!(y.values().to_vec(), vec![2.5, 4.0]);
    }

    #[test]
    fn ragged_records_fill_nulls_in_first_seen_order() {
        let table = records_to_table(&rows(json!([
            {"b": 1},
            {"a": 2, "b": 3},
        ])))
        .unwrap();

        let schema = table.schema();
        assert_eq!(schema.field(0).name(), "b");
        assert_eq!(schema.field(1).name(), "a");
        let a = table.column(1).as_primitive::<Int64Type>();
        assert!(a.is_null(0));
        assert_eq!(a.value(1), 2);
    }

    #[test]
    fn all_null_column_is_null_typed() {
        let table = records_to_table(&rows(json!([{"x": null}, {"x": null}]))).unwrap();
        assert_eq!(table.schema().field(0).data_type(), &DataType::Null);
        assert_eq!(table.column(0).len(), 2);
    }

    #[test]
    fn empty_objects_keep_row_count() {
        let table = records_to_table(&rows(json!([{}, {}, {}]))).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = records_to_table(&[]).unwrap_err();
        assert!(matches!(err, ConversionError::Empty));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn non_mapping_element_is_conversion_error() {
        let err = records_to_table(&rows(json!([{"x": 1}, 5]))).unwrap_err();
        match err {
            ConversionError::NotAMapping { index, found } => {
                assert_eq!(index, 1);
                assert_eq!(found, "number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_value_is_rejected() {
        let err = records_to_table(&rows(json!([{"x": [1, 2]}]))).unwrap_err();
        assert!(matches!(err, ConversionError::NestedValue { row: 0, .. }));
    }

    #[test]
    fn string_and_number_do_not_mix() {
        let err = records_to_table(&rows(json!([{"x": 1}, {"x": "one"}]))).unwrap_err();
        match err {
            ConversionError::MixedTypes { column, first, other } => {
                assert_eq!(column, "x");
                assert_eq!(first, "integer");
                assert_eq!(other, "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
