//! HTTP surface: liveness on `/`, predictions on `POST /predict`.

use std::time::Instant;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::anyhow;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::PipelineError;
use crate::pipeline::{InferencePipeline, PredictionVector};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Records are validated by the converter, not by serde.
    pub data: Vec<JsonValue>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predictions: PredictionVector,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Error → response mapping
// ---------------------------------------------------------------------------

impl ResponseError for PipelineError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = if self.is_client_error() {
            format!("Value Error: {self}")
        } else {
            format!("Internal Server Error: {self}")
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { detail })
    }
}

fn log_failure(err: &PipelineError) {
    match err {
        PipelineError::Conversion(e) => warn!("Rejected input: {e}"),
        PipelineError::Processing(cause)
        | PipelineError::Inference(cause)
        | PipelineError::Unexpected(cause) => error!("{err}: {cause:#}"),
    }
}

/// JSON extractor settings: body size limit and `{"detail": ...}` error bodies.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            warn!("Rejected request body: {err}");
            let status = match &err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                _ => StatusCode::BAD_REQUEST,
            };
            let body = ErrorBody {
                detail: format!("Value Error: {err}"),
            };
            InternalError::from_response(err, HttpResponse::build(status).json(body)).into()
        })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn read_root() -> HttpResponse {
    HttpResponse::Ok().json(MessageBody {
        message: "API is working!".to_string(),
    })
}

async fn head_root() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn predict(
    pipeline: web::Data<InferencePipeline>,
    body: web::Json<PredictRequest>,
) -> Result<web::Json<PredictResponse>, PipelineError> {
    let start_time = Instant::now();
    let records = body.into_inner().data;
    let count = records.len();

    // transform/predict are CPU bound; keep them off the async workers.
    let pipeline = pipeline.into_inner();
    let outcome = web::block(move || pipeline.infer(&records))
        .await
        .map_err(|e| PipelineError::Unexpected(anyhow!("blocking task failed: {e}")))
        .and_then(|result| result);

    match outcome {
        Ok(predictions) => {
            info!(
                "Predicted {count} record(s) in {} ms",
                start_time.elapsed().as_millis()
            );
            Ok(web::Json(PredictResponse { predictions }))
        }
        Err(e) => {
            log_failure(&e);
            Err(e)
        }
    }
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody {
        detail: "Not Found".to_string(),
    })
}

/// Register every route. The caller provides `web::Data<InferencePipeline>`
/// and, usually, [`json_config`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(read_root))
            .route(web::head().to(head_root)),
    )
    .service(web::resource("/predict").route(web::post().to(predict)))
    .default_service(web::route().to(not_found));
}
