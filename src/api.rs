// 🌐 REST API - axum router over the SQLite store
//
// Handlers lock the shared connection, call into `db`, and wrap results in
// ApiResponse. Library errors map to HTTP status codes in ApiError.

use crate::category::{Category, NewCategory};
use crate::dashboard::{self, DashboardSummary};
use crate::db::{self, Event};
use crate::error::TrackerError;
use crate::payments::{PaymentHistoryEntry, PaymentRecord};
use crate::subscription::{RawSubscription, Subscription, SubscriptionStatus};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| ApiError::LockPoisoned)
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("database lock poisoned")]
    LockPoisoned,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Tracker(TrackerError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Tracker(TrackerError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Tracker(TrackerError::Validation(_))
            | ApiError::Tracker(TrackerError::PaymentRejected(_)) => StatusCode::BAD_REQUEST,
            ApiError::Tracker(_) | ApiError::LockPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        // Field-level details travel in `data` so clients can highlight inputs
        let data = match &self {
            ApiError::Tracker(TrackerError::Validation(errors)) => {
                serde_json::to_value(errors).unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Null,
        };

        let body = ApiResponse {
            success: false,
            data,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request / Response shapes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub subscription: Subscription,
    pub payment: PaymentRecord,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Restrict the aggregate to one status (e.g. `active`)
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub entity_type: Option<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Money values rounded to cents for display
fn rounded(mut summary: DashboardSummary) -> DashboardSummary {
    summary.total_monthly = round2(summary.total_monthly);
    summary.total_yearly = round2(summary.total_yearly);
    for value in summary.category_breakdown.values_mut() {
        *value = round2(*value);
    }
    for ranked in &mut summary.top_subscriptions {
        ranked.monthly_cost = round2(ranked.monthly_cost);
    }
    summary
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/subscriptions
async fn list_subscriptions(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<Subscription>>>> {
    let conn = state.conn()?;
    let subs = db::get_all_subscriptions(&conn)?;
    Ok(Json(ApiResponse::ok(subs)))
}

/// POST /api/subscriptions
async fn create_subscription(
    State(state): State<AppState>,
    Json(raw): Json<RawSubscription>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Subscription>>)> {
    let conn = state.conn()?;
    let sub = db::create_subscription(&conn, &raw, Utc::now())?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(sub))))
}

/// GET /api/subscriptions/:id
async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let conn = state.conn()?;
    Ok(Json(ApiResponse::ok(db::get_subscription(&conn, &id)?)))
}

/// PUT /api/subscriptions/:id
async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(raw): Json<RawSubscription>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let conn = state.conn()?;
    let sub = db::update_subscription(&conn, &id, &raw, Utc::now())?;
    Ok(Json(ApiResponse::ok(sub)))
}

/// DELETE /api/subscriptions/:id - soft delete
async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let conn = state.conn()?;
    let sub = db::soft_delete_subscription(&conn, &id, Utc::now())?;
    Ok(Json(ApiResponse::ok(sub)))
}

/// POST /api/subscriptions/:id/restore
async fn restore_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let conn = state.conn()?;
    let sub = db::restore_subscription(&conn, &id, Utc::now())?;
    Ok(Json(ApiResponse::ok(sub)))
}

/// POST /api/subscriptions/:id/duplicate
async fn duplicate_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Subscription>>)> {
    let conn = state.conn()?;
    let copy = db::duplicate_subscription(&conn, &id, Utc::now())?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(copy))))
}

/// POST /api/subscriptions/:id/pay - body `{ "paymentMethod": ... }` is optional
async fn pay_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<PayRequest>>,
) -> ApiResult<Json<ApiResponse<PaymentResponse>>> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let mut conn = state.conn()?;
    let (subscription, payment) =
        db::mark_as_paid(&mut conn, &id, request.payment_method.as_deref(), Utc::now())?;
    Ok(Json(ApiResponse::ok(PaymentResponse {
        subscription,
        payment,
    })))
}

/// GET /api/payments - payment history, newest first
async fn payment_history(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<PaymentHistoryEntry>>>> {
    let conn = state.conn()?;
    Ok(Json(ApiResponse::ok(db::get_payment_history(&conn)?)))
}

/// GET /api/categories
async fn list_categories(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<Category>>>> {
    let conn = state.conn()?;
    Ok(Json(ApiResponse::ok(db::get_all_categories(&conn)?)))
}

/// POST /api/categories
async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let conn = state.conn()?;
    let category = db::add_category(&conn, input)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(category))))
}

/// GET /api/dashboard[?status=active]
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<ApiResponse<DashboardSummary>>> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(raw.parse::<SubscriptionStatus>().map_err(|message| {
            TrackerError::Validation(vec![crate::validation::ValidationError::new("status", &message)])
        })?),
        None => None,
    };

    let conn = state.conn()?;
    let mut subs = db::get_all_subscriptions(&conn)?;
    drop(conn);

    if let Some(status) = status {
        subs.retain(|s| s.status == status);
    }

    let summary = dashboard::summarize(&subs, Utc::now());
    Ok(Json(ApiResponse::ok(rounded(summary))))
}

/// GET /api/events/:entity_id[?entity_type=subscription]
async fn get_events(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Event>>>> {
    let entity_type = query.entity_type.as_deref().unwrap_or("subscription");
    let conn = state.conn()?;
    let events = db::get_events_for_entity(&conn, entity_type, &entity_id)?;
    Ok(Json(ApiResponse::ok(events)))
}

/// Routes nested under `/api`
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/subscriptions", get(list_subscriptions).post(create_subscription))
        .route(
            "/subscriptions/:id",
            get(get_subscription)
                .put(update_subscription)
                .delete(delete_subscription),
        )
        .route("/subscriptions/:id/duplicate", post(duplicate_subscription))
        .route("/subscriptions/:id/pay", post(pay_subscription))
        .route("/subscriptions/:id/restore", post(restore_subscription))
        .route("/payments", get(payment_history))
        .route("/categories", get(list_categories).post(create_category))
        .route("/dashboard", get(get_dashboard))
        .route("/events/:entity_id", get(get_events))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}
