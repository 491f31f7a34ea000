//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Sessions are created on first write. Reads of an unknown session answer
//! with an empty order and never create one. Every handler that touches
//! both maps takes the `sessions` lock before the `catalog` lock.

use super::{
    AppState,
    types::{
        AddRequest, CatalogResponse, ExtractionRequest, HealthResponse, LineRequest,
        OrderResponse, ProductsResponse, SearchParams, SessionResponse, StatusResponse,
        SubmitRequest,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grocer_core::{CatalogIndex, GrocerError, Ingestor, Order, Session, VariantKey};
use std::collections::BTreeMap;

/// Longest accepted session id.
const MAX_SESSION_ID_LENGTH: usize = 64;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Catalog and session counts.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions.read().await;
    let catalog = state.catalog.read().await;

    let response = StatusResponse {
        product_count: catalog.len(),
        category_count: catalog.category_counts().len(),
        tag_count: catalog.tag_count(),
        session_count: sessions.len(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// CATALOG HANDLERS
// =============================================================================

/// Search the current catalog. A missing or blank `q` lists everything.
pub async fn products_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let catalog = state.catalog.read().await;
    let found = catalog.search(params.q.as_deref().unwrap_or(""));
    (StatusCode::OK, Json(ProductsResponse::from_products(&found)))
}

/// Replace the catalog from raw JSON records and push it into every session.
pub async fn catalog_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let products = match Ingestor::products_from_json(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "Catalog replacement rejected");
            return (status_for(&e), Json(CatalogResponse::error(e.to_string())));
        }
    };

    let index = CatalogIndex::build(products);
    let product_count = index.len();

    let mut sessions = state.sessions.write().await;
    let mut catalog = state.catalog.write().await;

    for session in sessions.values_mut() {
        session.replace_catalog(index.clone());
    }
    *catalog = index;

    tracing::info!(
        products = product_count,
        sessions = sessions.len(),
        "Catalog replaced"
    );

    (
        StatusCode::OK,
        Json(CatalogResponse::success(product_count, sessions.len())),
    )
}

// =============================================================================
// SUBMISSION HANDLERS (replace mode)
// =============================================================================

/// Resolve a free-text order, replacing the session's order.
pub async fn submit_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let session = match session_mut(&state, &mut sessions, &id).await {
        Ok(s) => s,
        Err(e) => return order_error(e),
    };

    session.submit_text(&request.text);
    order_response(session, true)
}

/// Resolve a structured extraction, replacing the session's order.
pub async fn extraction_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ExtractionRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let session = match session_mut(&state, &mut sessions, &id).await {
        Ok(s) => s,
        Err(e) => return order_error(e),
    };

    session.submit_extraction(&request.items);
    order_response(session, true)
}

// =============================================================================
// CART HANDLERS (merge mode)
// =============================================================================

/// Add one unit of a catalog product.
pub async fn cart_add_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let session = match session_mut(&state, &mut sessions, &id).await {
        Ok(s) => s,
        Err(e) => return order_error(e),
    };

    let added = Ingestor::product_id(&request.product_id)
        .and_then(|pid| session.add_one(&pid, request.variant_hint.as_deref()));

    match added {
        Ok(_) => order_response(session, false),
        Err(e) => (status_for(&e), Json(OrderResponse::error(e.to_string()))),
    }
}

/// Increase an existing line by one; unknown keys leave the order unchanged.
pub async fn cart_increment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<LineRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let session = match session_mut(&state, &mut sessions, &id).await {
        Ok(s) => s,
        Err(e) => return order_error(e),
    };

    session.increment_one(&VariantKey::new(request.variant_key));
    order_response(session, false)
}

/// Decrease an existing line by one, removing it at zero.
pub async fn cart_decrement_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<LineRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let session = match session_mut(&state, &mut sessions, &id).await {
        Ok(s) => s,
        Err(e) => return order_error(e),
    };

    session.decrement_one(&VariantKey::new(request.variant_key));
    order_response(session, false)
}

/// Empty the order.
pub async fn cart_clear_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let session = match session_mut(&state, &mut sessions, &id).await {
        Ok(s) => s,
        Err(e) => return order_error(e),
    };

    session.clear();
    order_response(session, false)
}

// =============================================================================
// READ HANDLERS
// =============================================================================

/// Current order of a session. An unknown session reads as empty.
pub async fn order_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !is_valid_session_id(&id) {
        return order_error((StatusCode::BAD_REQUEST, invalid_id_message()));
    }

    let sessions = state.sessions.read().await;
    match sessions.get(&id) {
        Some(session) => order_response(session, false),
        None => (
            StatusCode::OK,
            Json(OrderResponse::from_order(&Order::new())),
        ),
    }
}

/// Products related to the most recently added line.
pub async fn recommendations_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    if !is_valid_session_id(&id) {
        return order_error((StatusCode::BAD_REQUEST, invalid_id_message())).into_response();
    }

    let sessions = state.sessions.read().await;
    let related = sessions
        .get(&id)
        .map(Session::recommendations)
        .unwrap_or_default();
    (StatusCode::OK, Json(ProductsResponse::from_products(&related))).into_response()
}

// =============================================================================
// SESSION LIFECYCLE
// =============================================================================

/// Drop a session and its order.
pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !is_valid_session_id(&id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(SessionResponse {
                success: false,
                existed: false,
                error: Some(invalid_id_message()),
            }),
        );
    }

    let existed = state.sessions.write().await.remove(&id).is_some();
    if existed {
        tracing::info!(session = %id, "Session deleted");
    }

    (
        StatusCode::OK,
        Json(SessionResponse {
            success: true,
            existed,
            error: None,
        }),
    )
}

// =============================================================================
// HELPERS
// =============================================================================

/// Session ids are 1-64 chars of `[A-Za-z0-9_-]`.
fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn invalid_id_message() -> String {
    format!(
        "Session id must be 1-{} characters of letters, digits, '_' or '-'",
        MAX_SESSION_ID_LENGTH
    )
}

/// Look up `id`, creating it over the current catalog on first use.
///
/// Caller must already hold the `sessions` write lock.
async fn session_mut<'a>(
    state: &AppState,
    sessions: &'a mut BTreeMap<String, Session>,
    id: &str,
) -> Result<&'a mut Session, (StatusCode, String)> {
    if !is_valid_session_id(id) {
        return Err((StatusCode::BAD_REQUEST, invalid_id_message()));
    }

    if !sessions.contains_key(id) {
        if sessions.len() >= state.api.max_sessions {
            tracing::warn!(limit = state.api.max_sessions, "Session limit reached");
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Session limit of {} reached", state.api.max_sessions),
            ));
        }
        let catalog = state.catalog.read().await;
        sessions.insert(id.to_string(), state.new_session(&catalog));
        tracing::info!(session = %id, products = catalog.len(), "Session created");
    }

    sessions.get_mut(id).ok_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        "Session unavailable".to_string(),
    ))
}

fn order_response(session: &Session, with_matches: bool) -> (StatusCode, Json<OrderResponse>) {
    let mut response = OrderResponse::from_order(session.order());
    if with_matches {
        response = response.with_matches(session.last_results());
    }
    (StatusCode::OK, Json(response))
}

fn order_error((status, msg): (StatusCode, String)) -> (StatusCode, Json<OrderResponse>) {
    (status, Json(OrderResponse::error(msg)))
}

/// HTTP status for a core error.
fn status_for(error: &GrocerError) -> StatusCode {
    match error {
        GrocerError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        GrocerError::InputTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        GrocerError::InvalidProduct(_)
        | GrocerError::DeserializationError(_)
        | GrocerError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        GrocerError::SerializationError(_) | GrocerError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use grocer_core::ProductId;

    #[test]
    fn session_id_validation() {
        assert!(is_valid_session_id("shopper-1"));
        assert!(is_valid_session_id("A_b"));
        assert!(is_valid_session_id(&"x".repeat(MAX_SESSION_ID_LENGTH)));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id(&"x".repeat(MAX_SESSION_ID_LENGTH + 1)));
        assert!(!is_valid_session_id("a b"));
        assert!(!is_valid_session_id("../etc"));
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            status_for(&GrocerError::ProductNotFound(ProductId::new("p9"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&GrocerError::InputTooLarge { actual: 2, max: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&GrocerError::DeserializationError("bad".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
