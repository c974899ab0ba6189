use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde::{Deserialize, Serialize};

use super::numeric::float_column;
use super::Processor;
use crate::data::Table;

// ---------------------------------------------------------------------------
// Persisted processor description
// ---------------------------------------------------------------------------

/// Feature processor as stored in `processor.json`.
///
/// ```json
/// {"kind": "column_transformer", "columns": [
///   {"op": "numeric", "column": "sqft", "mean": 1500.0, "scale": 400.0},
///   {"op": "one_hot", "column": "city", "categories": ["a", "b"], "handle_unknown": "ignore"}
/// ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessorSpec {
    /// Pass the table through untouched.
    Identity,
    /// Build an all-float feature table, one spec per input column, in order.
    ColumnTransformer { columns: Vec<ColumnSpec> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ColumnSpec {
    /// `(x - mean) / scale`, nulls replaced by `impute` first when set.
    Numeric {
        column: String,
        #[serde(default)]
        impute: Option<f64>,
        #[serde(default)]
        mean: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    /// One `<column>_<category>` indicator column per category.
    OneHot {
        column: String,
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: UnknownCategory,
    },
}

/// What to do with a value outside the known categories (or a null).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    #[default]
    Error,
    /// Encode as all zeros.
    Ignore,
}

fn unit_scale() -> f64 {
    1.0
}

impl ColumnSpec {
    fn column(&self) -> &str {
        match self {
            ColumnSpec::Numeric { column, .. } | ColumnSpec::OneHot { column, .. } => column,
        }
    }
}

impl ProcessorSpec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ProcessorSpec::Identity => "identity",
            ProcessorSpec::ColumnTransformer { .. } => "column_transformer",
        }
    }

    /// Reject parameter sets that could never transform anything.
    pub fn validate(&self) -> Result<(), String> {
        let ProcessorSpec::ColumnTransformer { columns } = self else {
            return Ok(());
        };
        if columns.is_empty() {
            return Err("column_transformer has no columns".into());
        }
        for spec in columns {
            match spec {
                ColumnSpec::Numeric {
                    column,
                    impute,
                    mean,
                    scale,
                } => {
                    if *scale == 0.0 || !scale.is_finite() {
                        return Err(format!("column '{column}': scale must be finite and non-zero"));
                    }
                    if !mean.is_finite() || impute.is_some_and(|v| !v.is_finite()) {
                        return Err(format!("column '{column}': mean/impute must be finite"));
                    }
                }
                ColumnSpec::OneHot {
                    column, categories, ..
                } => {
                    if categories.is_empty() {
                        return Err(format!("column '{column}': one_hot needs at least one category"));
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transformation
// ---------------------------------------------------------------------------

impl Processor for ProcessorSpec {
    fn transform(&self, table: &Table) -> Result<Table> {
        match self {
            ProcessorSpec::Identity => Ok(table.clone()),
            ProcessorSpec::ColumnTransformer { columns } => transform_columns(columns, table),
        }
    }
}

fn transform_columns(specs: &[ColumnSpec], table: &Table) -> Result<Table> {
    let schema = table.schema();
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();

    for spec in specs {
        let index = schema
            .index_of(spec.column())
            .map_err(|_| anyhow!("column '{}' not found in input", spec.column()))?;

        match spec {
            ColumnSpec::Numeric {
                column,
                impute,
                mean,
                scale,
            } => {
                let values = float_column(table, index)?;
                let scaled = values
                    .iter()
                    .enumerate()
                    .map(|(row, v)| {
                        let x = match v.or(*impute) {
                            Some(x) => x,
                            None => bail!("column '{column}', row {row}: missing value"),
                        };
                        Ok(Some((x - mean) / scale))
                    })
                    .collect::<Result<Float64Array>>()?;
                fields.push(Field::new(column.as_str(), DataType::Float64, false));
                arrays.push(Arc::new(scaled));
            }
            ColumnSpec::OneHot {
                column,
                categories,
                handle_unknown,
            } => {
                let labels = category_labels(table, index, column)?;
                let mut indicators = vec![vec![0.0_f64; labels.len()]; categories.len()];
                for (row, label) in labels.iter().enumerate() {
                    let hit = label
                        .as_deref()
                        .and_then(|l| categories.iter().position(|c| c == l));
                    match (hit, handle_unknown) {
                        (Some(cat), _) => indicators[cat][row] = 1.0,
                        (None, UnknownCategory::Ignore) => {}
                        (None, UnknownCategory::Error) => match label {
                            Some(l) => bail!("column '{column}', row {row}: unknown category '{l}'"),
                            None => bail!("column '{column}', row {row}: missing value"),
                        },
                    }
                }
                for (category, values) in categories.iter().zip(indicators) {
                    fields.push(Field::new(format!("{column}_{category}"), DataType::Float64, false));
                    arrays.push(Arc::new(Float64Array::from(values)));
                }
            }
        }
    }

    let options = RecordBatchOptions::new().with_row_count(Some(table.num_rows()));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
        .context("assembling transformed table")
}

/// Category labels of a column as strings (integers and booleans are formatted).
fn category_labels(table: &Table, index: usize, column: &str) -> Result<Vec<Option<String>>> {
    let col = table.column(index);
    let as_text = match col.data_type() {
        DataType::Utf8 => col.clone(),
        dt if dt.is_integer() || matches!(dt, DataType::Boolean | DataType::Null | DataType::LargeUtf8) => {
            cast(col, &DataType::Utf8)?
        }
        dt => bail!("column '{column}' has type {dt}, expected categorical values"),
    };
    Ok(as_text
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records_to_table;
    use arrow::datatypes::Float64Type;
    use serde_json::json;

    fn column_values(table: &Table, name: &str) -> Vec<f64> {
        let index = table.schema().index_of(name).unwrap();
        table.column(index).as_primitive::<Float64Type>().values().to_vec()
    }

    fn transformer(columns: serde_json::Value) -> ProcessorSpec {
        serde_json::from_value(json!({"kind": "column_transformer", "columns": columns})).unwrap()
    }

    #[test]
    fn identity_passes_table_through() {
        let table = records_to_table(&[json!({"x": 1, "s": "a"})]).unwrap();
        assert_eq!(ProcessorSpec::Identity.transform(&table).unwrap(), table);
    }

    #[test]
    fn numeric_scales_and_imputes() {
        let p = transformer(json!([
            {"op": "numeric", "column": "x", "mean": 2.0, "scale": 2.0, "impute": 4.0}
        ]));
        let table = records_to_table(&[json!({"x": 6}), json!({"x": null})]).unwrap();
        let out = p.transform(&table).unwrap();
        assert_eq!(column_values(&out, "x"), vec![2.0, 1.0]);
    }

    #[test]
    fn numeric_without_impute_rejects_missing() {
        let p = transformer(json!([{"op": "numeric", "column": "x"}]));
        let table = records_to_table(&[json!({"x": 1}), json!({})]).unwrap();
        let err = p.transform(&table).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn numeric_rejects_strings() {
        let p = transformer(json!([{"op": "numeric", "column": "x"}]));
        let table = records_to_table(&[json!({"x": "not-a-number"})]).unwrap();
        assert!(p.transform(&table).is_err());
    }

    #[test]
    fn one_hot_encodes_in_category_order() {
        let p = transformer(json!([
            {"op": "one_hot", "column": "c", "categories": ["red", "blue"]}
        ]));
        let table = records_to_table(&[json!({"c": "blue"}), json!({"c": "red"})]).unwrap();
        let out = p.transform(&table).unwrap();
        assert_eq!(out.num_columns(), 2);
        assert_eq!(column_values(&out, "c_red"), vec![0.0, 1.0]);
        assert_eq!(column_values(&out, "c_blue"), vec![1.0, 0.0]);
    }

    #[test]
    fn one_hot_unknown_category_policy() {
        let table = records_to_table(&[json!({"c": "green"})]).unwrap();

        let strict = transformer(json!([
            {"op": "one_hot", "column": "c", "categories": ["red"]}
        ]));
        let err = strict.transform(&table).unwrap_err();
        assert!(err.to_string().contains("unknown category 'green'"));

        let lenient = transformer(json!([
            {"op": "one_hot", "column": "c", "categories": ["red"], "handle_unknown": "ignore"}
        ]));
        let out = lenient.transform(&table).unwrap();
        assert_eq!(column_values(&out, "c_red"), vec![0.0]);
    }

    #[test]
    fn one_hot_accepts_integer_codes() {
        let p = transformer(json!([
            {"op": "one_hot", "column": "k", "categories": ["1", "2"]}
        ]));
        let table = records_to_table(&[json!({"k": 2})]).unwrap();
        let out = p.transform(&table).unwrap();
        assert_eq!(column_values(&out, "k_2"), vec![1.0]);
    }

    #[test]
    fn missing_input_column_fails() {
        let p = transformer(json!([{"op": "numeric", "column": "absent"}]));
        let table = records_to_table(&[json!({"x": 1})]).unwrap();
        let err = p.transform(&table).unwrap_err();
        assert!(err.to_string().contains("'absent' not found"));
    }

    #[test]
    fn validate_catches_degenerate_parameters() {
        assert!(transformer(json!([])).validate().is_err());
        assert!(transformer(json!([{"op": "numeric", "column": "x", "scale": 0.0}]))
            .validate()
            .is_err());
        assert!(transformer(json!([{"op": "one_hot", "column": "c", "categories": []}]))
            .validate()
            .is_err());
        assert!(ProcessorSpec::Identity.validate().is_ok());
    }
}
