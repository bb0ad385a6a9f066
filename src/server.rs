//! Optional HTTP surface (spec §6 "external collaborator").
//!
//! Grounded on `pcastone-orca`'s axum handler/error conventions: plain
//! `async fn` handlers returning `(StatusCode, Json<T>)`, and a
//! `{detail: string}` error body (spec §6) rather than the richer
//! `ApiErrorResponse` the teacher uses, since the spec fixes the exact
//! envelope shape. The graph is held behind `RwLock<Arc<Graph>>` so a
//! `/reload` swaps in a freshly built graph atomically (spec §5)
//! without blocking concurrent `/simulate` reads for longer than a
//! pointer clone.

use std::sync::{Arc, RwLock};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::comparator::{self, ComparisonRequest, ComparisonResponse};
use crate::config::EngineConfig;
use crate::error::{LoadError, SimulationError};
use crate::graph::Graph;
use crate::loader::{self, PackDocument};
use crate::model::{Edge, Node, Rule};
use crate::propagation::{self, SimulationRequest, SimulationResponse};

#[derive(Clone)]
pub struct AppState {
    graph: Arc<RwLock<Arc<Graph>>>,
    config: EngineConfig,
}

impl AppState {
    pub fn new(graph: Graph, config: EngineConfig) -> Self {
        AppState {
            graph: Arc::new(RwLock::new(Arc::new(graph))),
            config,
        }
    }

    fn current(&self) -> Arc<Graph> {
        self.graph.read().expect("graph lock poisoned").clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/graph", get(get_graph))
        .route("/simulate", post(post_simulate))
        .route("/simulate/compare", post(post_compare))
        .route("/reload", post(post_reload))
        .layer(logging_layer())
        .layer(cors_layer())
        .with_state(state)
}

/// Request/response tracing at INFO, mirroring `pcastone-orca`'s
/// `logging_layer`.
fn logging_layer() -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
}

/// Permissive CORS, same default as `pcastone-orca`'s `cors_layer` —
/// this surface has no browser-facing deployment story yet, so a
/// restricted allow-list would just be unused configuration surface.
fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { detail: detail.into() }))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
struct GraphView {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    rules: Vec<Rule>,
}

async fn get_graph(State(state): State<AppState>) -> Json<GraphView> {
    let graph = state.current();
    Json(GraphView {
        nodes: graph.nodes().cloned().collect(),
        edges: graph.edges().to_vec(),
        rules: graph.rules().to_vec(),
    })
}

async fn post_simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> Result<Json<SimulationResponse>, (StatusCode, Json<ErrorBody>)> {
    let graph = state.current();
    propagation::simulate(&graph, &request, &state.config)
        .map(Json)
        .map_err(|e| simulation_error_response(&e))
}

async fn post_compare(
    State(state): State<AppState>,
    Json(request): Json<ComparisonRequest>,
) -> Result<Json<ComparisonResponse>, (StatusCode, Json<ErrorBody>)> {
    let graph = state.current();
    comparator::compare(&graph, &request, &state.config)
        .map(Json)
        .map_err(|e| simulation_error_response(&e))
}

#[derive(Deserialize)]
struct ReloadRequest {
    documents: Vec<PackDocument>,
}

#[derive(Serialize)]
struct ReloadResponse {
    node_count: usize,
    edge_count: usize,
    diagnostics: Vec<String>,
}

async fn post_reload(
    State(state): State<AppState>,
    Json(request): Json<ReloadRequest>,
) -> Result<Json<ReloadResponse>, (StatusCode, Json<ErrorBody>)> {
    let (graph, diagnostics) =
        loader::load_pack(&request.documents).map_err(|e| load_error_response(&e))?;

    let response = ReloadResponse {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        diagnostics: diagnostics.iter().map(ToString::to_string).collect(),
    };

    // The previously loaded graph stays active until this single swap
    // completes (spec §5, §7 — fatal load errors never touch it).
    *state.graph.write().expect("graph lock poisoned") = Arc::new(graph);

    Ok(Json(response))
}

fn simulation_error_response(error: &SimulationError) -> (StatusCode, Json<ErrorBody>) {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, error.to_string())
}

fn load_error_response(error: &LoadError) -> (StatusCode, Json<ErrorBody>) {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}
