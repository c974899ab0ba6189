//! Offline scoring: run the inference pipeline over a records file.
//!
//! Usage: `score <records.{json,csv,parquet}> [artifacts-dir]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use tabular_serve::api::PredictResponse;
use tabular_serve::artifact::Artifacts;
use tabular_serve::data::loader::load_file;
use tabular_serve::InferencePipeline;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let records_path = PathBuf::from(
        args.next()
            .context("usage: score <records-file> [artifacts-dir]")?,
    );
    let artifacts_dir = PathBuf::from(args.next().unwrap_or_else(|| "artifacts".to_string()));

    let pipeline = InferencePipeline::from(Artifacts::load(&artifacts_dir)?);
    let table = load_file(&records_path)
        .with_context(|| format!("loading {}", records_path.display()))?;
    info!(
        "Scoring {} row(s) from {}",
        table.num_rows(),
        records_path.display()
    );

    let predictions = pipeline.infer_table(&table)?;
    println!("{}", serde_json::to_string(&PredictResponse { predictions })?);
    Ok(())
}
