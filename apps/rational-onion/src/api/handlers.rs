//! # API Handlers
//!
//! Each handler takes a store from the pool, runs one engine operation and
//! releases the store when it returns. Engine errors become `ApiError`
//! responses through `?`.

use super::AppState;
use super::error::ApiError;
use super::types::{
    CreateRelationshipRequest, CreateRelationshipResponse, HealthResponse, InsertArgumentRequest,
    InsertArgumentResponse, RootResponse, StatusResponse, VerifyParams, VerifyRequest,
};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use rational_onion_core::{ArgumentDraft, GraphView, NodeId, OnionError, VerificationReport};

/// Message served at `/`.
pub const WELCOME_MESSAGE: &str = "Welcome to the Rational-Onion API!";

// =============================================================================
// SERVICE
// =============================================================================

/// `GET /`
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// `GET /status`
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.pool.read().await?;
    Ok(Json(StatusResponse {
        backend: state.settings.backend.to_string(),
        persistent: session.is_persistent(),
        node_count: session.node_count()?,
        edge_count: session.edge_count()?,
        pool_size: state.pool.size(),
        auth_enabled: !state.settings.api_keys.is_empty(),
    }))
}

// =============================================================================
// ARGUMENTS AND RELATIONSHIPS
// =============================================================================

/// `POST /insert-argument`
pub async fn insert_argument_handler(
    State(state): State<AppState>,
    payload: Result<Json<InsertArgumentRequest>, JsonRejection>,
) -> Result<Json<InsertArgumentResponse>, ApiError> {
    let Json(request) = payload?;
    let draft = ArgumentDraft::from(request);

    let outcome = state.pool.write().await?.insert_argument(&draft)?;
    Ok(Json(InsertArgumentResponse::new(outcome, draft)))
}

/// `POST /create-relationship`
pub async fn create_relationship_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateRelationshipRequest>, JsonRejection>,
) -> Result<Json<CreateRelationshipResponse>, ApiError> {
    let Json(request) = payload?;
    let source = NodeId::new(request.source_id);
    let target = NodeId::new(request.target_id);

    let outcome = state.pool.write().await?.create_relationship(
        &source,
        &target,
        &request.relationship_type,
    )?;

    Ok(Json(CreateRelationshipResponse {
        message: outcome.message,
        relationship_id: outcome.relationship_id,
    }))
}

// =============================================================================
// VERIFICATION AND VISUALIZATION
// =============================================================================

/// Apply `strict` to a finished report.
fn finish(
    report: VerificationReport,
    params: VerifyParams,
) -> Result<Json<VerificationReport>, ApiError> {
    if params.strict {
        Ok(Json(report.into_result()?))
    } else {
        Ok(Json(report))
    }
}

/// `GET /verify-argument-structure`: verify the whole graph.
pub async fn verify_graph_handler(
    State(state): State<AppState>,
    params: Result<Query<VerifyParams>, QueryRejection>,
) -> Result<Json<VerificationReport>, ApiError> {
    let Query(params) = params?;
    let report = state.pool.read().await?.verify_structure(None)?;
    finish(report, params)
}

/// `POST /verify-argument-structure`: verify one argument.
pub async fn verify_argument_handler(
    State(state): State<AppState>,
    params: Result<Query<VerifyParams>, QueryRejection>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerificationReport>, ApiError> {
    let Query(params) = params?;
    let Json(request) = payload?;

    let argument_id = request
        .argument_id
        .map(NodeId::new)
        .filter(|id| !id.is_blank())
        .ok_or_else(|| OnionError::validation("argument_id", "Argument ID is required"))?;

    let report = state
        .pool
        .read()
        .await?
        .verify_structure(Some(&argument_id))?;
    finish(report, params)
}

/// `GET /visualize-argument-dag`
pub async fn visualize_handler(
    State(state): State<AppState>,
) -> Result<Json<GraphView>, ApiError> {
    let view = state.pool.read().await?.visualize()?;
    Ok(Json(view))
}
