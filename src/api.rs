//! HTTP surface: Liveness and prediction endpoints.
//!
//! - `GET /` returns a fixed liveness message
//! - `POST /predict` takes a flat JSON object of the 13 named attributes
//!   and returns `{prediction, confidence}`

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::application::InferenceService;
use crate::domain::{InvalidPayload, PatientFeatures};

pub const LIVENESS_MESSAGE: &str = "Heart Disease ML API is live!";

/// Shared state for all handlers.
pub struct AppState {
    pub inference: InferenceService,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Serialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: &'static str,
}

#[derive(Debug, Serialize)]
struct ValidationError<'a> {
    error: ApiErrorDetail,
    missing: &'a [String],
    unknown: &'a [String],
    non_numeric: &'a [String],
}

fn api_error(status: StatusCode, error_type: &'static str, message: String) -> Response {
    let body = ApiError {
        error: ApiErrorDetail {
            message,
            error_type,
        },
    };
    (status, Json(body)).into_response()
}

fn validation_error(invalid: &InvalidPayload) -> Response {
    let body = ValidationError {
        error: ApiErrorDetail {
            message: invalid.to_string(),
            error_type: "validation_error",
        },
        missing: &invalid.missing,
        unknown: &invalid.unknown,
        non_numeric: &invalid.non_numeric,
    };
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

/// `GET /`
pub async fn home() -> Json<Value> {
    Json(serde_json::json!({ "message": LIVENESS_MESSAGE }))
}

/// `POST /predict`
///
/// Values are kept as raw JSON until each field is read, so a number that
/// overflows `f64` is reported as a non-numeric field rather than a
/// malformed body.
pub async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let fields: BTreeMap<String, Box<RawValue>> = match serde_json::from_slice(&body) {
        Ok(fields) => fields,
        Err(e) => {
            return api_error(
                StatusCode::BAD_REQUEST,
                "invalid_json",
                format!("Request body must be a JSON object: {e}"),
            );
        }
    };

    let parsed = fields
        .iter()
        .map(|(name, raw)| (name.as_str(), serde_json::from_str::<f64>(raw.get()).ok()));

    let patient = match PatientFeatures::from_fields(parsed) {
        Ok(patient) => patient,
        Err(invalid) => {
            tracing::debug!(%invalid, "Rejected prediction request");
            return validation_error(&invalid);
        }
    };

    match state.inference.predict(&patient) {
        Ok(prediction) => Json(prediction).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Prediction failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "prediction_error",
                e.to_string(),
            )
        }
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .with_state(state)
}
