//! Records → table → processor → model → predictions.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, UInt64Type};
use log::debug;
use serde_json::{Number, Value as JsonValue};

use crate::artifact::{Artifacts, Model, Processor};
use crate::data::{records_to_table, Table};
use crate::error::PipelineError;

/// One JSON number per input row, in input order.
pub type PredictionVector = Vec<Number>;

/// Stateless orchestration over the shared, read-only artifacts.
#[derive(Clone)]
pub struct InferencePipeline {
    processor: Arc<dyn Processor>,
    model: Arc<dyn Model>,
}

impl From<Artifacts> for InferencePipeline {
    fn from(artifacts: Artifacts) -> Self {
        Self::new(artifacts.processor, artifacts.model)
    }
}

impl InferencePipeline {
    pub fn new(processor: Arc<dyn Processor>, model: Arc<dyn Model>) -> Self {
        Self { processor, model }
    }

    /// Run the full pipeline over a batch of JSON records.
    pub fn infer(&self, records: &[JsonValue]) -> Result<PredictionVector, PipelineError> {
        let table = records_to_table(records)?;
        debug!(
            "converted {} record(s) into {} column(s)",
            table.num_rows(),
            table.num_columns()
        );
        self.infer_table(&table)
    }

    /// Run transform → predict → output conversion on an already-built table.
    pub fn infer_table(&self, table: &Table) -> Result<PredictionVector, PipelineError> {
        let transformed = self
            .processor
            .transform(table)
            .map_err(PipelineError::Processing)?;
        debug!("processor produced {} feature column(s)", transformed.num_columns());

        let raw = self
            .model
            .predict(&transformed)
            .map_err(PipelineError::Inference)?;

        to_prediction_vector(raw.as_ref(), table.num_rows()).map_err(PipelineError::Inference)
    }
}

/// Turn the model's raw output into plain JSON numbers.
///
/// Integer outputs stay integers, floats stay floats, booleans become 0/1.
/// The output must be null-free, finite and hold exactly one value per row.
fn to_prediction_vector(raw: &dyn Array, expected_rows: usize) -> Result<PredictionVector> {
    if raw.len() != expected_rows {
        bail!(
            "model returned {} prediction(s) for {} row(s)",
            raw.len(),
            expected_rows
        );
    }
    if raw.null_count() > 0 {
        bail!("model returned {} missing prediction(s)", raw.null_count());
    }

    let dt = raw.data_type();
    if dt.is_signed_integer() || matches!(dt, DataType::Boolean) {
        let values = cast(raw, &DataType::Int64).context("casting predictions")?;
        Ok(values
            .as_primitive::<Int64Type>()
            .values()
            .iter()
            .map(|&v| Number::from(v))
            .collect())
    } else if dt.is_unsigned_integer() {
        let values = cast(raw, &DataType::UInt64).context("casting predictions")?;
        Ok(values
            .as_primitive::<UInt64Type>()
            .values()
            .iter()
            .map(|&v| Number::from(v))
            .collect())
    } else if dt.is_floating() || dt.is_numeric() {
        let values = cast(raw, &DataType::Float64).context("casting predictions")?;
        values
            .as_primitive::<Float64Type>()
            .values()
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                Number::from_f64(v).ok_or_else(|| anyhow!("prediction for row {row} is not finite ({v})"))
            })
            .collect()
    } else {
        bail!("model returned non-numeric predictions of type {dt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
    use serde_json::json;

    /// Sums every column of the (integer) table row-wise.
    struct SumModel;

    impl Model for SumModel {
        fn predict(&self, table: &Table) -> Result<ArrayRef> {
            let mut sums = vec![0_i64; table.num_rows()];
            for col in table.columns() {
                let ints = cast(col, &DataType::Int64)?;
                for (sum, v) in sums.iter_mut().zip(ints.as_primitive::<Int64Type>().values().iter()) {
                    *sum += v;
                }
            }
            Ok(Arc::new(Int64Array::from(sums)))
        }
    }

    struct Identity;

    impl Processor for Identity {
        fn transform(&self, table: &Table) -> Result<Table> {
            Ok(table.clone())
        }
    }

    struct Failing;

    impl Processor for Failing {
        fn transform(&self, _: &Table) -> Result<Table> {
            bail!("unseen category")
        }
    }

    impl Model for Failing {
        fn predict(&self, _: &Table) -> Result<ArrayRef> {
            bail!("shape mismatch")
        }
    }

    fn pipeline(processor: impl Processor + 'static, model: impl Model + 'static) -> InferencePipeline {
        InferencePipeline::new(Arc::new(processor), Arc::new(model))
    }

    fn records(v: JsonValue) -> Vec<JsonValue> {
        v.as_array().unwrap().clone()
    }

    #[test]
    fn identity_and_sum_yields_row_sums() {
        let p = pipeline(Identity, SumModel);
        let out = p
            .infer(&records(json!([{"x": 1, "y": 2}, {"x": 3, "y": 4}])))
            .unwrap();
        assert_eq!(json!(out), json!([3, 7]));
    }

    #[test]
    fn one_prediction_per_record_in_order() {
        let p = pipeline(Identity, SumModel);
        let input: Vec<JsonValue> = (0..50).map(|i| json!({"x": i})).collect();
        let out = p.infer(&input).unwrap();
        let expected: Vec<Number> = (0..50).map(Number::from).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let p = pipeline(Identity, SumModel);
        let input = records(json!([{"x": 5, "y": -1}, {"x": 0, "y": 0}]));
        assert_eq!(p.infer(&input).unwrap(), p.infer(&input).unwrap());
    }

    #[test]
    fn conversion_errors_propagate_unchanged() {
        let p = pipeline(Identity, SumModel);
        let err = p.infer(&records(json!([{"x": 1}, "row"]))).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Conversion(ConversionError::NotAMapping { index: 1, .. })
        ));
        assert!(matches!(
            p.infer(&[]).unwrap_err(),
            PipelineError::Conversion(ConversionError::Empty)
        ));
    }

    #[test]
    fn stage_failures_are_classified() {
        let input = records(json!([{"x": 1}]));
        assert!(matches!(
            pipeline(Failing, SumModel).infer(&input).unwrap_err(),
            PipelineError::Processing(_)
        ));
        assert!(matches!(
            pipeline(Identity, Failing).infer(&input).unwrap_err(),
            PipelineError::Inference(_)
        ));
    }

    #[test]
    fn output_conversion_checks_shape_and_values() {
        let floats = Float64Array::from(vec![1.5, 2.0]);
        assert_eq!(json!(to_prediction_vector(&floats, 2).unwrap()), json!([1.5, 2.0]));

        assert!(to_prediction_vector(&floats, 3).is_err());
        assert!(to_prediction_vector(&Float64Array::from(vec![f64::NAN]), 1).is_err());
        assert!(to_prediction_vector(&Float64Array::from(vec![Some(1.0), None]), 2).is_err());
        assert!(to_prediction_vector(&StringArray::from(vec!["a"]), 1).is_err());

        let bools = BooleanArray::from(vec![true, false]);
        assert_eq!(json!(to_prediction_vector(&bools, 2).unwrap()), json!([1, 0]));
    }
}
