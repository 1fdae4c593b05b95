//! # HTTP API
//!
//! Builds the axum router for the tokenization service. All endpoints share
//! application state through axum's `State` extractor and every response
//! carries the same permissive CORS headers.
//!
//! ## Endpoints
//!
//! | Method | Path       | Description                                  |
//! |--------|------------|----------------------------------------------|
//! | GET    | `/health`  | Liveness probe (exempt from authentication)  |
//! | POST   | `/tokens`  | Tokenize a card payload                      |
//! | POST   | `/charges` | Redeem a bearer token for the card fields    |
//!
//! ## Status mapping
//!
//! The transport layer is the only place failure kinds become status codes:
//! a missing redemption token is 400, everything else that fails — including
//! payload validation — is 500 with an `{ "error": ... }` body. The 500 for
//! validation mirrors the system this replaces; see DESIGN.md before
//! "fixing" it to 400.

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cardvault::{CardProjection, Vault, VaultError};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The server's reported version string.
    pub version: String,
    /// The tokenization/redemption service.
    pub vault: Arc<Vault>,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Static API key. `None` disables authentication.
    pub api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all routes, authentication, CORS,
/// and tracing. Ready to be served on the configured API port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let protected = Router::new()
        .route("/tokens", post(tokenize_handler))
        .route("/charges", post(charge_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Success payload for `POST /tokens`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The minted bearer token (64 hex characters).
    pub token: String,
}

/// Success payload for `POST /charges`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChargeResponse {
    /// Always "Charge processed".
    pub message: String,
    /// The redeemed card's safe fields.
    pub data: CardProjection,
}

/// Generic error body returned on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body for the missing-token client error on `POST /charges`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Authentication Middleware
// ---------------------------------------------------------------------------

/// Rejects requests lacking the configured `x-api-key` header.
///
/// A no-op when the server was started without an API key.
async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = &state.api_key {
        let presented = request
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Unauthorized".into(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the server is alive.
///
/// Liveness probe for orchestrators. Deliberately does not touch the store.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok", "version": state.version })),
    )
}

/// `POST /tokens` — tokenizes a card payload.
///
/// Takes the raw body and parses it here rather than through the `Json`
/// extractor: a syntactically broken body must produce the same
/// `500 { "error": ... }` envelope as every other unexpected failure, not
/// the extractor's plain-text 400. Schema validation happens inside the
/// service so the error message can name the offending field.
async fn tokenize_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let timer = state.metrics.request_latency_seconds.start_timer();

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            timer.observe_duration();
            tracing::debug!("unparseable tokenization body: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("invalid JSON body: {e}"),
                }),
            )
                .into_response();
        }
    };

    let cards_before = state.vault.db().card_count();

    let result = state.vault.tokenize(&payload);
    timer.observe_duration();

    match result {
        Ok(token) => {
            state.metrics.tokens_issued_total.inc();
            // Approximate under concurrent identical submissions.
            let created = state.vault.db().card_count().saturating_sub(cards_before);
            state.metrics.cards_created_total.inc_by(created as u64);

            (StatusCode::OK, Json(TokenResponse { token })).into_response()
        }
        Err(err) => {
            if matches!(err, VaultError::Validation(_)) {
                state.metrics.validation_failures_total.inc();
                tracing::debug!("tokenization rejected: {}", err);
            } else {
                tracing::error!("tokenization failed: {}", err);
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// `POST /charges` — redeems a bearer token for the card's safe fields.
///
/// The token comes from the `Authorization` header, either as
/// `Bearer <token>` or as the raw header value.
async fn charge_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let timer = state.metrics.request_latency_seconds.start_timer();
    let token = authorization_token(&headers);

    let result = state.vault.redeem(token.as_deref());
    timer.observe_duration();

    match result {
        Ok(card) => {
            state.metrics.redemptions_total.inc();
            (
                StatusCode::OK,
                Json(ChargeResponse {
                    message: "Charge processed".into(),
                    data: card,
                }),
            )
                .into_response()
        }
        Err(VaultError::MissingToken) => {
            state.metrics.redemption_failures_total.inc();
            (
                StatusCode::BAD_REQUEST,
                Json(MessageResponse {
                    message: VaultError::MissingToken.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            state.metrics.redemption_failures_total.inc();
            tracing::debug!("redemption failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Extracts the bearer token from the `Authorization` header.
///
/// Returns `None` when the header is absent, non-UTF-8, or empty after
/// stripping the `Bearer ` scheme prefix.
fn authorization_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw)
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
