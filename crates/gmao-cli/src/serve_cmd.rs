use std::net::SocketAddr;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

use gmao_core::due::{self, DueStatus};
use gmao_core::generator::{self, GenerationError};
use gmao_core::store::PgStore;
use gmao_db::models::{MaintenancePlan, WorkOrder};
use gmao_db::queries::work_orders::OrderCounts;
use gmao_db::queries::{plans as plan_db, users as user_db, work_orders as order_db};

use crate::config::parse_now;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// RFC 3339 timestamp (or bare date) to evaluate at.
    #[serde(default)]
    pub now: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DueQuery {
    pub now: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub plan_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DueEntry {
    pub plan_id: i64,
    pub code: String,
    pub name: String,
    pub status: &'static str,
    pub next_due: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl DueEntry {
    fn new(plan: &MaintenancePlan, status: DueStatus) -> Self {
        Self {
            plan_id: plan.id,
            code: plan.code.clone(),
            name: plan.name.clone(),
            status: status.label(),
            next_due: plan.next_due,
            problem: match status {
                DueStatus::Invalid(err) => Some(err.to_string()),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountsResponse {
    pub pending: i64,
    pub in_progress: i64,
    pub done: i64,
    pub cancelled: i64,
    pub total: i64,
}

impl From<OrderCounts> for CountsResponse {
    fn from(c: OrderCounts) -> Self {
        Self {
            pending: c.pending,
            in_progress: c.in_progress,
            done: c.done,
            cancelled: c.cancelled,
            total: c.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanDetailResponse {
    #[serde(flatten)]
    pub plan: MaintenancePlan,
    pub order_counts: CountsResponse,
    pub orders: Vec<WorkOrder>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Offset used when a request does not carry its own `now`.
    pub site_offset: FixedOffset,
}

impl AppState {
    fn resolve_now(&self, raw: Option<&str>) -> Result<DateTime<FixedOffset>, AppError> {
        match raw {
            Some(raw) => {
                parse_now(raw, self.site_offset).map_err(|e| AppError::bad_request(format!("{e:#}")))
            }
            None => Ok(Utc::now().with_timezone(&self.site_offset)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/maintenance/generate", post(generate))
        .route("/api/maintenance/preview", post(preview))
        .route("/api/maintenance/due", get(list_due))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/{id}", get(get_plan_detail))
        .route("/api/work-orders", get(list_work_orders))
        .route("/api/technicians", get(list_technicians))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("gmao serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("gmao serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// An empty body means "no overrides".
fn parse_generate_body(body: &Bytes) -> Result<GenerateRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::bad_request(format!("invalid body: {e}")))
}

async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let request = parse_generate_body(&body)?;
    let now = state.resolve_now(request.now.as_deref())?;
    let store = PgStore::new(state.pool.clone());
    let report = generator::generate_due_orders(&store, &now).await?;
    Ok(Json(report).into_response())
}

async fn preview(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let request = parse_generate_body(&body)?;
    let now = state.resolve_now(request.now.as_deref())?;
    let snapshot = PgStore::new(state.pool.clone())
        .snapshot()
        .await
        .map_err(|e| AppError::from(GenerationError::StoreUnavailable(e)))?;
    let (report, _) = generator::preview_due_orders(snapshot, &now).await?;
    Ok(Json(report).into_response())
}

async fn list_due(
    State(state): State<AppState>,
    Query(query): Query<DueQuery>,
) -> Result<axum::response::Response, AppError> {
    let now = state.resolve_now(query.now.as_deref())?;
    let plans = plan_db::list_plans(&state.pool)
        .await
        .map_err(AppError::internal)?;
    let entries: Vec<DueEntry> = plans
        .iter()
        .map(|p| DueEntry::new(p, due::evaluate(p, &now)))
        .collect();
    Ok(Json(entries).into_response())
}

async fn list_plans(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let plans = plan_db::list_plans(&state.pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(plans).into_response())
}

async fn get_plan_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<axum::response::Response, AppError> {
    let plan = plan_db::get_plan(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;

    let counts = order_db::get_order_counts(&state.pool, id)
        .await
        .map_err(AppError::internal)?;

    let orders = order_db::list_orders_for_plan(&state.pool, id)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(PlanDetailResponse {
        plan,
        order_counts: counts.into(),
        orders,
    })
    .into_response())
}

async fn list_work_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<axum::response::Response, AppError> {
    let orders = order_db::list_work_orders(&state.pool, query.plan_id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(orders).into_response())
}

async fn list_technicians(
    State(state): State<AppState>,
) -> Result<axum::response::Response, AppError> {
    let technicians = user_db::list_technicians(&state.pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(technicians).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
