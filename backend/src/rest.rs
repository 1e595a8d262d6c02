//! REST surface for the credit operations.
//!
//! The identity gateway in front of this service forwards the verified
//! caller in trusted headers; handlers turn those into a `CallerIdentity`
//! once, at this boundary, and the core never re-derives it.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::{AdminAdjustRequest, ConsumeRequest, ErrorBody, InitializeRequest};
use tracing::{info, warn};

use crate::domain::{CreditError, CreditService};
use crate::identity::CallerIdentity;

/// Header carrying the authenticated user id, set by the gateway
pub const USER_HEADER: &str = "x-toolhub-user-id";
/// Header carrying the supervisor claim ("true"/"1"), set by the gateway
pub const SUPERVISOR_HEADER: &str = "x-toolhub-supervisor";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub credit_service: CreditService,
}

impl AppState {
    pub fn new(credit_service: CreditService) -> Self {
        Self { credit_service }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/healthz", get(healthz))
        .route("/api/credits/initialize", post(initialize))
        .route("/api/credits/consume", post(consume))
        .route("/api/credits/adjust", post(admin_adjust))
        .route("/api/credits/:app_id", get(read))
        .route("/api/credits/:app_id/ledger/:user_id", get(ledger_history))
        .with_state(state)
}

/// Construct the caller identity from the gateway headers. Returns None
/// when no user header is present; the core turns that into
/// `Unauthenticated`.
fn caller_from_headers(headers: &HeaderMap) -> Option<CallerIdentity> {
    let user_id = headers.get(USER_HEADER)?.to_str().ok()?.trim();
    if user_id.is_empty() {
        return None;
    }
    let supervisor = headers
        .get(SUPERVISOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == "true" || value == "1")
        .unwrap_or(false);
    Some(CallerIdentity::new(user_id, supervisor))
}

impl IntoResponse for CreditError {
    fn into_response(self) -> Response {
        let status = match &self {
            CreditError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CreditError::PermissionDenied => StatusCode::FORBIDDEN,
            CreditError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CreditError::NotFound(_) => StatusCode::NOT_FOUND,
            CreditError::ResourceExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
            CreditError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Storage failure: {:?}", self);
        }
        let body = ErrorBody::new(self.kind(), self.to_string());
        (status, Json(body)).into_response()
    }
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

/// POST /api/credits/initialize
async fn initialize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InitializeRequest>,
) -> impl IntoResponse {
    info!("POST /api/credits/initialize - app: {}", request.app_id);

    let caller = caller_from_headers(&headers);
    match state.credit_service.initialize(caller.as_ref(), request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Initialize failed: {}", e);
            e.into_response()
        }
    }
}

/// GET /api/credits/:app_id
async fn read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(app_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/credits/{}", app_id);

    let caller = caller_from_headers(&headers);
    match state.credit_service.read(caller.as_ref(), &app_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Read failed: {}", e);
            e.into_response()
        }
    }
}

/// POST /api/credits/consume
async fn consume(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ConsumeRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/credits/consume - app: {}, amount: {}",
        request.app_id, request.amount
    );

    let caller = caller_from_headers(&headers);
    match state.credit_service.consume(caller.as_ref(), request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Consume failed: {}", e);
            e.into_response()
        }
    }
}

/// POST /api/credits/adjust
async fn admin_adjust(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AdminAdjustRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/credits/adjust - app: {}, target: {}, delta: {}",
        request.app_id, request.target_user_id, request.delta
    );

    let caller = caller_from_headers(&headers);
    match state
        .credit_service
        .admin_adjust(caller.as_ref(), request)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Admin adjust failed: {}", e);
            e.into_response()
        }
    }
}

/// Query parameters for the ledger history endpoint
#[derive(Deserialize, Debug)]
struct HistoryQuery {
    limit: Option<u32>,
}

/// GET /api/credits/:app_id/ledger/:user_id
async fn ledger_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((app_id, user_id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    info!("GET /api/credits/{}/ledger/{}", app_id, user_id);

    let caller = caller_from_headers(&headers);
    match state
        .credit_service
        .ledger_history(caller.as_ref(), &app_id, &user_id, query.limit)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Ledger history failed: {}", e);
            e.into_response()
        }
    }
}
