use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::compute::concat_batches;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::convert::{columns_to_table, records_to_table};
use super::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a records file into a [`Table`].  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – `[{...}, ...]` or the request envelope `{"data": [{...}, ...]}`
/// * `.csv`     – header row with column names, one record per line
/// * `.parquet` – any flat Parquet file (e.g. `df.to_parquet()`)
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = match &root {
        JsonValue::Array(items) => items,
        JsonValue::Object(obj) => obj
            .get("data")
            .and_then(|d| d.as_array())
            .context("Expected a top-level array or an object with a 'data' array")?,
        _ => bail!("Expected a top-level array or an object with a 'data' array"),
    };

    Ok(records_to_table(records)?)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Every column is typed from its cells: empty → null, then integer, float,
/// boolean, falling back to string.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut columns: Vec<(String, Vec<CellValue>)> =
        headers.into_iter().map(|h| (h, Vec::new())).collect();
    let mut num_rows = 0;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, (_, cells)) in columns.iter_mut().enumerate() {
            cells.push(guess_cell_type(record.get(col_idx).unwrap_or("")));
        }
        num_rows += 1;
    }

    Ok(columns_to_table(columns, num_rows)?)
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Parquet already carries a typed schema, so the batches are used as-is.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context("reading parquet record batch")?;

    if batches.is_empty() {
        bail!("Parquet file contains no rows");
    }
    concat_batches(&schema, &batches).context("concatenating parquet batches")
}
