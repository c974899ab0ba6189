use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};

use crate::data::Table;

/// Read column `index` as floats. Integers, floats, booleans and all-null
/// columns are accepted; nulls stay null.
pub(crate) fn float_column(table: &Table, index: usize) -> Result<Float64Array> {
    let schema = table.schema();
    let field = schema.field(index);
    let col = table.column(index);

    let dt = col.data_type();
    if !(dt.is_numeric() || matches!(dt, DataType::Boolean | DataType::Null)) {
        bail!("column '{}' has non-numeric type {dt}", field.name());
    }

    let floats = cast(col, &DataType::Float64)
        .with_context(|| format!("casting column '{}' to float", field.name()))?;
    Ok(floats.as_primitive::<Float64Type>().clone())
}

/// Every column as a dense float vector. Fails on any null cell.
pub(crate) fn dense_columns(table: &Table) -> Result<Vec<Float64Array>> {
    let schema = table.schema();
    (0..table.num_columns())
        .map(|index| {
            let values = float_column(table, index)?;
            if values.null_count() > 0 {
                bail!(
                    "column '{}' contains {} missing value(s)",
                    schema.field(index).name(),
                    values.null_count()
                );
            }
            Ok(values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records_to_table;
    use serde_json::json;

    #[test]
    fn ints_and_bools_become_floats() {
        let table = records_to_table(&[json!({"a": 2, "b": true})]).unwrap();
        let cols = dense_columns(&table).unwrap();
        assert_eq!(cols[0].value(0), 2.0);
        assert_eq!(cols[1].value(0), 1.0);
    }

    #[test]
    fn strings_are_not_numeric() {
        let table = records_to_table(&[json!({"x": "not-a-number"})]).unwrap();
        let err = float_column(&table, 0).unwrap_err();
        assert!(err.to_string().contains("non-numeric"));
    }

    #[test]
    fn nulls_survive_float_column_but_fail_dense() {
        let table = records_to_table(&[json!({"x": 1}), json!({"x": null})]).unwrap();
        assert!(float_column(&table, 0).unwrap().is_null(1));
        assert!(dense_columns(&table).is_err());
    }
}
