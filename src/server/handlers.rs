use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::core::{Category, ClassifierError, DEFAULT_MODEL_ID};
use crate::pipelines::classification::{
    BatchRequest, BatchResult, ClassificationRequest, ClassificationResult,
    TextClassificationModel,
};
use crate::pipelines::utils::describe_device;

pub const SERVICE_VERSION: &str = "2.0.0";

// Published evaluation of the default checkpoint; not known for others.
const DEFAULT_MODEL_ACCURACY: &str = "90.14%";
const DEFAULT_MODEL_F1: &str = "90.00%";

pub async fn root<M: TextClassificationModel>(State(state): State<AppState<M>>) -> Json<Value> {
    Json(json!({
        "message": "E-Commerce Product Classification API",
        "model": state.model_id,
        "version": SERVICE_VERSION,
        "categories": state.orchestrator.registry().len(),
        "endpoints": [
            "GET /health",
            "POST /classify",
            "POST /classify/batch",
            "GET /categories",
            "GET /categories/{id}",
            "GET /categories/name/{name}",
            "GET /model-info",
        ],
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub device: String,
    pub categories: usize,
}

pub async fn health<M: TextClassificationModel>(
    State(state): State<AppState<M>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let model = state.orchestrator.lifecycle().acquire()?;
    Ok(Json(HealthResponse {
        status: "healthy",
        model: state.model_id.clone(),
        device: describe_device(model.device()),
        categories: state.orchestrator.registry().len(),
    }))
}

pub async fn classify<M: TextClassificationModel>(
    State(state): State<AppState<M>>,
    body: Result<Json<ClassificationRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let Json(request) = body?;
    let result = state.orchestrator.handle_single(request).await?;
    tracing::debug!(
        top = result.predictions.first().map(|p| p.category_name.as_str()),
        inference_time = result.inference_time,
        "classified text"
    );
    Ok(Json(result))
}

pub async fn classify_batch<M: TextClassificationModel>(
    State(state): State<AppState<M>>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, ApiError> {
    let Json(request) = body?;
    Ok(Json(state.orchestrator.handle_batch(request).await?))
}

pub async fn list_categories<M: TextClassificationModel>(
    State(state): State<AppState<M>>,
) -> Json<Vec<Category>> {
    Json(state.orchestrator.registry().all().to_vec())
}

pub async fn category_by_id<M: TextClassificationModel>(
    State(state): State<AppState<M>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let id: i64 = raw_id.parse().map_err(|_| {
        ClassifierError::validation(
            "category_id",
            format!("must be an integer, got '{raw_id}'"),
        )
    })?;
    state
        .orchestrator
        .registry()
        .lookup(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            ClassifierError::NotFound {
                kind: "category id",
                key: id.to_string(),
            }
            .into()
        })
}

pub async fn category_by_name<M: TextClassificationModel>(
    State(state): State<AppState<M>>,
    Path(name): Path<String>,
) -> Result<Json<Category>, ApiError> {
    state
        .orchestrator
        .registry()
        .by_name(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            ClassifierError::NotFound {
                kind: "category",
                key: name,
            }
            .into()
        })
}

/// `/categories/name` with no name. Matched ahead of `/categories/{id}` so it
/// reports a missing category instead of a malformed id.
pub async fn category_name_missing() -> ApiError {
    ClassifierError::NotFound {
        kind: "category",
        key: String::new(),
    }
    .into()
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub base_model: Option<String>,
    pub device: String,
    pub num_parameters: Option<u64>,
    pub num_categories: usize,
    pub category_id_range: String,
    pub max_sequence_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f1_score: Option<&'static str>,
}

pub async fn model_info<M: TextClassificationModel>(
    State(state): State<AppState<M>>,
) -> Result<Json<ModelInfo>, ApiError> {
    let model = state.orchestrator.lifecycle().acquire()?;
    let metadata = model.metadata();
    let num_categories = state.orchestrator.registry().len();
    let is_default = metadata.model_id == DEFAULT_MODEL_ID;

    Ok(Json(ModelInfo {
        model_name: metadata.model_id,
        base_model: metadata.base_model,
        device: describe_device(model.device()),
        num_parameters: metadata.num_parameters,
        num_categories,
        category_id_range: format!("0-{}", num_categories.saturating_sub(1)),
        max_sequence_length: metadata.max_sequence_length,
        accuracy: is_default.then_some(DEFAULT_MODEL_ACCURACY),
        f1_score: is_default.then_some(DEFAULT_MODEL_F1),
    }))
}
