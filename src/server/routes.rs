//! HTTP Routes
//!
//! Router and handlers for the embedding API. The core returns typed
//! results; everything JSON-shaped lives here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::QueryError;
use crate::metrics::Metrics;
use crate::model::{LoadPhase, ModelState};
use crate::observability::{HealthCheck, HealthStatus};
use crate::rank;
use crate::server::Config;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelState>,
    pub metrics: Arc<Metrics>,
    pub health: Arc<HealthCheck>,
    pub config: Arc<Config>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, model: Arc<ModelState>) -> Self {
        let mut health = HealthCheck::new();
        let model_for_check = model.clone();
        health.register("model", move || match model_for_check.phase() {
            LoadPhase::Ready(_) => (HealthStatus::Healthy, None),
            LoadPhase::NotStarted | LoadPhase::Loading => {
                (HealthStatus::Degraded, Some("model loading".to_string()))
            }
            LoadPhase::Failed(err) => (HealthStatus::Unhealthy, Some(err.to_string())),
        });

        Self {
            model,
            metrics: Arc::new(Metrics::new()),
            health: Arc::new(health),
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}

/// Error payload: `{"detail": "..."}`, status per the taxonomy.
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status = match err {
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            QueryError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct WordInput {
    pub word: String,
}

#[derive(Debug, Deserialize)]
pub struct WordsInput {
    pub words: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct WordEmbedding {
    pub embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
pub struct OptionalEmbedding {
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Serialize)]
pub struct BatchEmbeddings {
    pub results: HashMap<String, OptionalEmbedding>,
}

#[derive(Debug, Serialize)]
pub struct SimilarWord {
    pub word: String,
    pub similarity: f32,
}

#[derive(Debug, Serialize)]
pub struct SimilarWords {
    pub similar_words: Vec<SimilarWord>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarParams {
    pub n: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub model: String,
    pub dimensions: Option<usize>,
    pub vocabulary_size: Option<usize>,
    pub status: String,
    pub started_at: String,
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/embedding", post(embedding))
        .route("/embeddings", post(embeddings))
        .route("/similar/:word", get(similar))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/stats", get(stats))
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    let store = state.model.store().ok();
    Json(ServiceInfo {
        message: "Word Embeddings API".to_string(),
        model: state.config.model_name.clone(),
        dimensions: store.as_ref().map(|s| s.dimension()),
        vocabulary_size: store.as_ref().map(|s| s.len()),
        status: state.model.phase().as_str().to_string(),
        started_at: state.started_at.to_rfc3339(),
    })
}

/// Single-word lookup. A miss is a 404, unlike the batch endpoint.
async fn embedding(
    State(state): State<AppState>,
    Json(input): Json<WordInput>,
) -> Result<Json<WordEmbedding>, ApiError> {
    let start = Instant::now();
    let store = state.model.store()?;

    let vector = store
        .lookup(&input.word)
        .ok_or_else(|| QueryError::NotFound(input.word.clone()))?;

    let response = WordEmbedding {
        embedding: vector.to_vec(),
    };
    state.metrics.record_request("embedding", start.elapsed());
    Ok(Json(response))
}

/// Batch lookup. Missing words come back as null embeddings; one miss
/// never fails the rest of the batch. Results are keyed by the word as
/// requested, not its normalized form.
async fn embeddings(
    State(state): State<AppState>,
    Json(input): Json<WordsInput>,
) -> Result<Json<BatchEmbeddings>, ApiError> {
    let start = Instant::now();
    let store = state.model.store()?;

    let mut results = HashMap::with_capacity(input.words.len());
    for word in input.words {
        let embedding = store.lookup(&word).map(|v| v.to_vec());
        results.insert(word, OptionalEmbedding { embedding });
    }

    state.metrics.record_request("embeddings", start.elapsed());
    Ok(Json(BatchEmbeddings { results }))
}

async fn similar(
    State(state): State<AppState>,
    Path(word): Path<String>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarWords>, ApiError> {
    let start = Instant::now();
    let store = state.model.store()?;

    let n = params
        .n
        .unwrap_or(state.config.default_similar_count as i64);
    if n <= 0 {
        return Err(QueryError::InvalidInput(format!(
            "n must be a positive integer, got {}",
            n
        ))
        .into());
    }

    let ranked = rank::most_similar(&store, &word, n as usize)?;
    let response = SimilarWords {
        similar_words: ranked
            .into_iter()
            .map(|r| SimilarWord {
                word: r.token,
                similarity: r.similarity,
            })
            .collect(),
    };

    state.metrics.record_request("similar", start.elapsed());
    Ok(Json(response))
}

async fn health(State(state): State<AppState>) -> Response {
    let summary = state.health.check();
    let status = if summary.status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(summary)).into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    if state.model.is_ready() {
        (StatusCode::OK, Json(json!({ "ready": true }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ready": false, "status": state.model.phase().as_str() })),
        )
            .into_response()
    }
}

async fn stats(State(state): State<AppState>) -> Response {
    Json(state.metrics.snapshot()).into_response()
}
