//! # Grocer HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Catalog and session counts
//! - `GET /products?q=` - Search the catalog
//! - `PUT /catalog` - Replace the catalog from raw JSON records
//! - `POST /sessions/{id}/submit` - Resolve a free-text order (replace)
//! - `POST /sessions/{id}/extraction` - Resolve structured items (replace)
//! - `POST /sessions/{id}/cart/add` - Add one unit of a product (merge)
//! - `POST /sessions/{id}/cart/increment` - Increase a line (merge)
//! - `POST /sessions/{id}/cart/decrement` - Decrease a line (merge)
//! - `POST /sessions/{id}/cart/clear` - Empty the order
//! - `GET /sessions/{id}/order` - Current order
//! - `GET /sessions/{id}/recommendations` - Related products
//! - `DELETE /sessions/{id}` - Drop a session
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `GROCER_CORS_ORIGINS`: Comma-separated allowed origins, or "*" for all (default: localhost only)
//! - `GROCER_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `GROCER_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use middleware::{
    DEFAULT_RATE_LIMIT, RATE_LIMIT_ENV, create_rate_limiter, resolve_rate_limit,
};
pub use types::{
    AddRequest, CatalogResponse, ExtractionRequest, HealthResponse, LineRequest, MatchJson,
    OrderLineJson, OrderResponse, ProductJson, ProductsResponse, SearchParams, SessionResponse,
    StatusResponse, SubmitRequest,
};

use crate::config::{ApiConfig, GrocerConfig};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use grocer_core::primitives::RECOMMENDATION_LIMIT;
use grocer_core::{CatalogIndex, GrocerError, MatchOptions, Session};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable overriding the configured CORS origins.
pub const CORS_ORIGINS_ENV: &str = "GROCER_CORS_ORIGINS";

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the current catalog and every live session.
///
/// Lock order is always `sessions` before `catalog`.
#[derive(Clone)]
pub struct AppState {
    /// Catalog snapshot cloned into newly created sessions.
    pub catalog: Arc<RwLock<CatalogIndex>>,
    /// Live sessions keyed by client-chosen id.
    pub sessions: Arc<RwLock<BTreeMap<String, Session>>>,
    pub options: MatchOptions,
    pub recommendation_limit: usize,
    pub api: ApiConfig,
}

impl AppState {
    /// Create state over `catalog` with default settings.
    #[must_use]
    pub fn new(catalog: CatalogIndex) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            options: MatchOptions::default(),
            recommendation_limit: RECOMMENDATION_LIMIT,
            api: ApiConfig::default(),
        }
    }

    /// Create state over `catalog` honoring a loaded configuration.
    #[must_use]
    pub fn with_config(catalog: CatalogIndex, config: &GrocerConfig) -> Self {
        Self {
            options: config.match_options(),
            recommendation_limit: config.matching.recommendation_limit,
            api: config.api.clone(),
            ..Self::new(catalog)
        }
    }

    /// A fresh session over a clone of the current catalog.
    pub(crate) fn new_session(&self, catalog: &CatalogIndex) -> Session {
        Session::with_options(catalog.clone(), self.options)
            .with_recommendation_limit(self.recommendation_limit)
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// `GROCER_CORS_ORIGINS` wins over `[api] cors_origins`. `*` allows every
/// origin; no configuration at all means localhost only.
fn build_cors_layer(configured: Option<&[String]>) -> CorsLayer {
    let origins: Option<Vec<String>> = match std::env::var(CORS_ORIGINS_ENV).ok() {
        Some(raw) => Some(raw.split(',').map(|s| s.trim().to_string()).collect()),
        None => configured.map(<[String]>::to_vec),
    };

    match origins {
        Some(list) if list.iter().any(|o| o == "*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if `GROCER_API_KEY` is set)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.api.cors_origins.as_deref());
    let body_limit = state.api.body_limit_bytes;

    let rate_limit = resolve_rate_limit(state.api.rate_limit);
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible. \
             Set {} to enable authentication.",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/products", get(handlers::products_handler))
        .route("/catalog", put(handlers::catalog_handler))
        .route("/sessions/{id}", delete(handlers::delete_session_handler))
        .route("/sessions/{id}/submit", post(handlers::submit_handler))
        .route("/sessions/{id}/extraction", post(handlers::extraction_handler))
        .route("/sessions/{id}/cart/add", post(handlers::cart_add_handler))
        .route(
            "/sessions/{id}/cart/increment",
            post(handlers::cart_increment_handler),
        )
        .route(
            "/sessions/{id}/cart/decrement",
            post(handlers::cart_decrement_handler),
        )
        .route("/sessions/{id}/cart/clear", post(handlers::cart_clear_handler))
        .route("/sessions/{id}/order", get(handlers::order_handler))
        .route(
            "/sessions/{id}/recommendations",
            get(handlers::recommendations_handler),
        );

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), GrocerError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GrocerError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Grocer HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| GrocerError::IoError(format!("Server error: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_route_is_wired() {
        let router = create_router(AppState::new(CatalogIndex::new()));
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let router = create_router(AppState::new(CatalogIndex::new()));
        let response = router
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn config_flows_into_state() {
        let config = GrocerConfig::from_toml_str(
            "[matching]\ninclude_unavailable = true\nrecommendation_limit = 5",
        )
        .unwrap();
        let state = AppState::with_config(CatalogIndex::new(), &config);
        assert!(state.options.include_unavailable);
        assert_eq!(state.recommendation_limit, 5);
    }
}
