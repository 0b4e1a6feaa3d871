use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use docsearch_core::{process_queries, DocId, Document, DocumentStatus, ExecutionPolicy, SearchEngine, SearchError};
use docsearch_indexer::{load_documents, InputDoc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::{self, JoinError};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Space-separated stop words.
    pub stop_words: String,
    /// Documents loaded before the server starts answering.
    pub input: Option<PathBuf>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub policy: ExecutionPolicy,
}

#[derive(Deserialize)]
pub struct PolicyParams {
    #[serde(default)]
    pub policy: ExecutionPolicy,
}

#[derive(Deserialize)]
pub struct MatchParams {
    pub q: String,
    #[serde(default)]
    pub policy: ExecutionPolicy,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub results: Vec<Document>,
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub queries: Vec<String>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub results: Vec<Vec<Document>>,
}

#[derive(Serialize)]
pub struct DocumentList {
    pub count: usize,
    pub ids: Vec<DocId>,
}

#[derive(Serialize)]
pub struct FrequenciesResponse {
    pub id: DocId,
    pub frequencies: BTreeMap<String, f64>,
}

#[derive(Serialize)]
pub struct MatchResponse {
    pub id: DocId,
    pub words: Vec<String>,
    pub status: DocumentStatus,
}

/// Shared engine: many concurrent readers or a single writer.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<SearchEngine>>,
}

/// Maps engine failures onto HTTP status codes with a JSON body.
#[derive(Debug)]
pub enum ApiError {
    Search(SearchError),
    /// The blocking task running the engine call panicked or was cancelled.
    Worker(JoinError),
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self::Search(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::Worker(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Search(err @ SearchError::UnknownDocument(_)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Search(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Worker(err) => {
                tracing::error!(error = %err, "engine task failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let mut engine = SearchEngine::from_stop_words_text(&config.stop_words)?;
    if let Some(input) = &config.input {
        load_documents(&mut engine, input)?;
    }
    Ok(build_app_with_engine(engine))
}

pub fn build_app_with_engine(engine: SearchEngine) -> Router {
    let app_state = AppState { engine: Arc::new(RwLock::new(engine)) };

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
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/search/batch", post(batch_handler))
        .route("/documents", get(list_documents).post(add_document))
        .route("/documents/:doc_id", delete(remove_document))
        .route("/documents/:doc_id/frequencies", get(frequencies_handler))
        .route("/documents/:doc_id/match", get(match_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let query = params.q.clone();
    let results = task::spawn_blocking(move || {
        let engine = state.engine.read();
        engine.find_top_documents_with_status(params.policy, &params.q, params.status)
    })
    .await??;
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query, took_s: elapsed.as_secs_f64(), results }))
}

pub async fn batch_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let results = task::spawn_blocking(move || {
        let engine = state.engine.read();
        process_queries(&engine, &request.queries)
    })
    .await??;
    Ok(Json(BatchResponse { results }))
}

pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentList> {
    let engine = state.engine.read();
    let ids: Vec<DocId> = engine.iter().copied().collect();
    Json(DocumentList { count: ids.len(), ids })
}

pub async fn add_document(
    State(state): State<AppState>,
    Json(doc): Json<InputDoc>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    state.engine.write().add_document(doc.id, &doc.text, doc.status, &doc.ratings)?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": doc.id }))))
}

pub async fn remove_document(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
    Query(params): Query<PolicyParams>,
) -> StatusCode {
    state.engine.write().remove_document_with(params.policy, doc_id);
    StatusCode::NO_CONTENT
}

pub async fn frequencies_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Json<FrequenciesResponse> {
    let engine = state.engine.read();
    let frequencies = engine
        .word_frequencies(doc_id)
        .iter()
        .map(|(term, &tf)| (term.to_string(), tf))
        .collect();
    Json(FrequenciesResponse { id: doc_id, frequencies })
}

pub async fn match_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
    Query(params): Query<MatchParams>,
) -> Result<Json<MatchResponse>, ApiError> {
    let (words, status) = task::spawn_blocking(move || {
        let engine = state.engine.read();
        let (words, status) = engine.match_document_with(params.policy, &params.q, doc_id)?;
        Ok::<_, SearchError>((words.into_iter().map(str::to_string).collect::<Vec<_>>(), status))
    })
    .await??;
    Ok(Json(MatchResponse { id: doc_id, words, status }))
}
