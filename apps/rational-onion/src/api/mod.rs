//! # Rational Onion HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `POST /insert-argument` - Insert a Toulmin argument
//! - `POST /create-relationship` - Link two existing nodes
//! - `GET /verify-argument-structure` - Verify the whole graph
//! - `POST /verify-argument-structure` - Verify one argument (`{argument_id}`)
//! - `GET /visualize-argument-dag` - Nodes and edges for rendering
//! - `GET /status` - Node and edge counts
//! - `GET /health` - Health check
//! - `GET /` - Welcome message
//!
//! Both verification routes take `?strict=true` to answer a failed
//! verification with a 400 `graph_error` instead of a report.
//!
//! ## Security Configuration
//!
//! All of it comes from `Settings`:
//! - `cors_origins`: allowed origins, or `*` for all (default: localhost only)
//! - `rate_limit`: `N/second|minute|hour` (default: `100/minute`, `off` to disable)
//! - `api_keys`: if non-empty, requires `X-API-Key` or `Authorization: Bearer`

mod auth;
mod error;
mod handlers;
mod middleware;
mod pool;
mod types;

pub use auth::{API_KEY_HEADER, ApiKeys, is_authorized};
pub use error::{
    AUTHENTICATION_ERROR, ApiError, ErrorBody, ErrorDetail, RATE_LIMIT_ERROR, status_for,
};
pub use handlers::WELCOME_MESSAGE;
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use pool::{ACQUIRE_OPERATION, ReadHandle, StorePool, WriteHandle};
pub use types::{
    CreateRelationshipRequest, CreateRelationshipResponse, HealthResponse, InsertArgumentRequest,
    InsertArgumentResponse, RootResponse, StatusResponse, VerifyParams, VerifyRequest,
};

use crate::error::AppError;
use crate::settings::Settings;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use rational_onion_core::{OnionError, Session};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the store pool and the immutable settings.
#[derive(Clone)]
pub struct AppState {
    pub pool: StorePool,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wrap a session in a pool sized from `settings`.
    #[must_use]
    pub fn new(session: Session, settings: Settings) -> Self {
        let pool = StorePool::new(
            session,
            settings.pool_size,
            Duration::from_millis(settings.acquire_timeout_ms),
        );
        Self {
            pool,
            settings: Arc::new(settings),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

fn allowed_headers() -> [HeaderName; 3] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(API_KEY_HEADER),
    ]
}

/// Build the CORS layer from the configured origins.
///
/// - `["*"]`: allows all origins (development only)
/// - empty: localhost only
/// - otherwise: the listed origins
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }
    if origins.is_empty() {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers())
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8000",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8000",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers())
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting - rejects requests over the limit (if enabled)
/// 4. Authentication - validates the API key (if keys are configured)
pub fn create_router(state: AppState) -> Result<Router, OnionError> {
    let settings = Arc::clone(&state.settings);
    let cors = build_cors_layer(&settings.cors_origins);

    let rate_limiter = match settings.rate_limit()? {
        Some(limit) => {
            tracing::info!("Rate limiting enabled: {}", limit);
            Some(create_rate_limiter(limit))
        }
        None => {
            tracing::info!("Rate limiting disabled");
            None
        }
    };

    if settings.api_keys.is_empty() {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set ONION_API_KEYS to enable authentication."
        );
    } else {
        tracing::info!(keys = settings.api_keys.len(), "API key authentication enabled");
    }

    let mut router = Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/insert-argument", post(handlers::insert_argument_handler))
        .route(
            "/create-relationship",
            post(handlers::create_relationship_handler),
        )
        .route(
            "/verify-argument-structure",
            get(handlers::verify_graph_handler).post(handlers::verify_argument_handler),
        )
        .route("/visualize-argument-dag", get(handlers::visualize_handler));

    // Authentication is innermost: it runs after the rate limiter.
    if !settings.api_keys.is_empty() {
        let keys: ApiKeys = settings.api_keys.clone().into();
        router = router.layer(axum_middleware::from_fn_with_state(
            keys,
            auth::api_key_auth_middleware,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    Ok(router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state))
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server on the configured address.
pub async fn run_server(settings: Settings, session: Session) -> Result<(), AppError> {
    let addr = settings.bind_addr();
    let state = AppState::new(session, settings);
    let router = create_router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed on {}: {}", addr, e)))?;

    tracing::info!("Rational Onion HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
