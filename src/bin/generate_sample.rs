//! Write a matching processor/model pair plus a sample records file.
//!
//! Usage: `generate_sample [out-dir]` (default `artifacts`)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use tabular_serve::artifact::model::ModelSpec;
use tabular_serve::artifact::processor::{ColumnSpec, ProcessorSpec, UnknownCategory};
use tabular_serve::artifact::{MODEL_FILE, PROCESSOR_FILE};

const NEIGHBORHOODS: [&str; 3] = ["downtown", "suburb", "rural"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn sample_processor() -> ProcessorSpec {
    ProcessorSpec::ColumnTransformer {
        columns: vec![
            ColumnSpec::Numeric {
                column: "sqft".into(),
                impute: None,
                mean: 1500.0,
                scale: 400.0,
            },
            ColumnSpec::Numeric {
                column: "bedrooms".into(),
                impute: Some(3.0),
                mean: 3.0,
                scale: 1.0,
            },
            ColumnSpec::OneHot {
                column: "neighborhood".into(),
                categories: NEIGHBORHOODS.iter().map(|n| n.to_string()).collect(),
                handle_unknown: UnknownCategory::Ignore,
            },
        ],
    }
}

fn sample_model() -> ModelSpec {
    // sqft, bedrooms, downtown, suburb, rural
    ModelSpec::Linear {
        coefficients: vec![45_000.0, 12_000.0, 30_000.0, 0.0, -25_000.0],
        intercept: 250_000.0,
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text + "\n").with_context(|| format!("writing {}", path.display()))
}

fn sample_records(rng: &mut SimpleRng, rows: usize) -> Result<RecordBatch> {
    let mut sqft = Vec::with_capacity(rows);
    let mut bedrooms = Vec::with_capacity(rows);
    let mut neighborhood = Vec::with_capacity(rows);

    for _ in 0..rows {
        sqft.push(rng.gauss(1500.0, 400.0).max(300.0).round());
        // ~10% of rows leave bedrooms unset to exercise imputation.
        bedrooms.push(if rng.below(10) == 0 {
            None
        } else {
            Some(1 + rng.below(5) as i64)
        });
        neighborhood.push(NEIGHBORHOODS[rng.below(NEIGHBORHOODS.len() as u64) as usize]);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("sqft", DataType::Float64, false),
        Field::new("bedrooms", DataType::Int64, true),
        Field::new("neighborhood", DataType::Utf8, false),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(sqft)),
            Arc::new(Int64Array::from(bedrooms)),
            Arc::new(StringArray::from(neighborhood)),
        ],
    )
    .context("building sample records")
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "artifacts".to_string()),
    );
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    write_json(&out_dir.join(PROCESSOR_FILE), &sample_processor())?;
    write_json(&out_dir.join(MODEL_FILE), &sample_model())?;

    let mut rng = SimpleRng::new(42);
    let batch = sample_records(&mut rng, 30)?;

    let output_path = out_dir.join("sample_records.parquet");
    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!(
        "Wrote {PROCESSOR_FILE}, {MODEL_FILE} and {} records to {}",
        batch.num_rows(),
        out_dir.display()
    );
    Ok(())
}
