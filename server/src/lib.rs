use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use finder_core::topics::{parse_topic_name, TopicReport};
use finder_core::{FinderConfig, ForwardIndex, RfcFinder, ScoredRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub results: Vec<ScoredRecord>,
}

#[derive(Deserialize)]
pub struct TopicParams {
    #[serde(default)]
    pub docid: String,
    /// Topic count of the model to browse.
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct TopicDocsParams {
    /// Topic column name, `t01` for the first topic.
    #[serde(default)]
    pub topic: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct TopicDocsResponse {
    pub topic: String,
    pub k: usize,
    pub docs: Vec<ScoredRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub records: usize,
    pub documents: usize,
    pub topic_count: usize,
}

/// `/topics` body: the report, or `{}` for a document without topic coverage.
#[derive(Serialize)]
#[serde(untagged)]
pub enum TopicsBody {
    Report(TopicReport),
    Empty {},
}

pub type AppState = Arc<RfcFinder>;

/// Request failures as HTTP responses. Missing documents never get here: they are empty results.
pub enum ApiError {
    Core(finder_core::Error),
    BadRequest(String),
    Task(tokio::task::JoinError),
}

impl From<finder_core::Error> for ApiError {
    fn from(err: finder_core::Error) -> Self { Self::Core(err) }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self { Self::Task(err) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Core(err) => {
                let status = match &err {
                    finder_core::Error::IndexUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    finder_core::Error::ModelNotFound { .. } => StatusCode::NOT_FOUND,
                    finder_core::Error::Parse(_) | finder_core::Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Task(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        tracing::error!(error = %message, %status, "request failed");
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Open the service from `config` and wrap it in a router. Fails if metadata or index cannot be loaded.
pub fn build_app(config: FinderConfig) -> Result<Router> {
    let finder = RfcFinder::open(config)?;
    Ok(router(Arc::new(finder)))
}

pub fn router(finder: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/", get(|| async { "All good with root!" }))
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .route("/topics", get(topics_handler))
        .route("/topics/docs", get(topic_docs_handler))
        .with_state(finder)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn health_handler(State(finder): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        records: finder.metadata().len(),
        documents: finder.index().num_docs(),
        topic_count: finder.config().topic_count,
    })
}

pub async fn search_handler(
    State(finder): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.map(|k| k.clamp(1, MAX_K));
    let results = finder.search(&params.q, k)?;
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), results }))
}

pub async fn topics_handler(
    State(finder): State<AppState>,
    Query(params): Query<TopicParams>,
) -> Result<Json<TopicsBody>, ApiError> {
    let docid = params.docid.trim().to_uppercase();
    // A first request for a topic count loads its model from disk.
    let report = tokio::task::spawn_blocking(move || finder.get_topics(&docid, params.k)).await??;
    let body = match report {
        Some(report) => TopicsBody::Report(report),
        None => TopicsBody::Empty {},
    };
    Ok(Json(body))
}

pub async fn topic_docs_handler(
    State(finder): State<AppState>,
    Query(params): Query<TopicDocsParams>,
) -> Result<Json<TopicDocsResponse>, ApiError> {
    let name = params.topic.trim().to_lowercase();
    let topic = parse_topic_name(&name)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid topic name {:?}, expected t01, t02, ...", params.topic)))?;
    let k = params.k.unwrap_or(finder.config().topic_count);
    if topic as usize >= k {
        return Err(ApiError::BadRequest(format!("{name} is outside the {k}-topic model")));
    }
    let docs = tokio::task::spawn_blocking(move || finder.topic_docs(topic, Some(k))).await??;
    Ok(Json(TopicDocsResponse { topic: name, k, docs }))
}
