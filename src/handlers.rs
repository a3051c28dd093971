use crate::config::Config;
use crate::errors::AppError;
use crate::intake::constant_time_compare;
use crate::models::{Lead, LeadPatch, LeadStatus};
use crate::store::LeadStore;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "select-therapy-api",
            "version": "0.1.0"
        })),
    )
}

/// Validate the staff session credential from the Authorization header.
///
/// This is a separate trust boundary from the intake webhook's shared secret:
/// the two callers must never share a credential path. An unset key fails
/// closed as a configuration error, same as the intake side.
pub fn require_staff_session(config: &Config, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = config
        .staff_session_key
        .as_deref()
        .ok_or_else(|| AppError::Config("Staff session key not set".to_string()))?;

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing staff session".to_string()))?;

    if !constant_time_compare(token.trim(), expected.trim()) {
        return Err(AppError::Unauthorized("Invalid staff session".to_string()));
    }

    Ok(())
}

/// GET /api/v1/leads
///
/// All leads, most recently created first. Unauthenticated callers are
/// redirected to the login page rather than shown an error; any other
/// failure surfaces as its own structured response.
pub async fn list_leads(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Err(e) = require_staff_session(&state.config, &headers) {
        return match e {
            AppError::Unauthorized(_) => Redirect::to("/login").into_response(),
            other => other.into_response(),
        };
    }

    match LeadStore::new(state.db.clone()).list().await {
        Ok(leads) => {
            let rows: Vec<LeadRow> = leads.into_iter().map(LeadRow::from).collect();
            Json(json!({ "success": true, "data": rows })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// A lead as the read surfaces serve it: the stored row plus the resolved
/// status label, so both views render null/corrupt statuses the same way.
#[derive(Debug, Serialize)]
pub struct LeadRow {
    #[serde(flatten)]
    pub lead: Lead,
    pub status_label: &'static str,
}

impl From<Lead> for LeadRow {
    fn from(lead: Lead) -> Self {
        let status_label = lead.status_label();
        Self { lead, status_label }
    }
}

/// One column of the board view.
#[derive(Debug, Serialize)]
pub struct BoardColumn {
    pub status: &'static str,
    pub count: usize,
    pub leads: Vec<LeadRow>,
}

/// Group leads into one column per lifecycle state plus an "Unknown" bucket.
///
/// A null or unrecognized stored status lands in the Unknown column instead
/// of crashing or being silently folded into New; only the intake pipeline is
/// allowed to default to New, and only at creation time.
pub fn group_by_status(leads: Vec<Lead>) -> Vec<BoardColumn> {
    // Columns in LeadStatus::ALL order; discriminants index into it.
    let mut columns: Vec<BoardColumn> = LeadStatus::ALL
        .iter()
        .map(|s| BoardColumn {
            status: s.as_str(),
            count: 0,
            leads: Vec::new(),
        })
        .collect();
    let mut unknown = BoardColumn {
        status: "Unknown",
        count: 0,
        leads: Vec::new(),
    };

    for lead in leads {
        match lead.status.as_deref().and_then(LeadStatus::parse) {
            Some(status) => columns[status as usize].leads.push(LeadRow::from(lead)),
            None => unknown.leads.push(LeadRow::from(lead)),
        }
    }

    columns.push(unknown);
    for column in &mut columns {
        column.count = column.leads.len();
    }
    columns
}

/// GET /api/v1/leads/board
///
/// Board-view read surface: same rows as the list, grouped by status. Shares
/// the list's auth behavior so the two surfaces cannot drift.
pub async fn board_leads(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Err(e) = require_staff_session(&state.config, &headers) {
        return match e {
            AppError::Unauthorized(_) => Redirect::to("/login").into_response(),
            other => other.into_response(),
        };
    }

    match LeadStore::new(state.db.clone()).list().await {
        Ok(leads) => {
            let columns = group_by_status(leads);
            Json(json!({ "success": true, "columns": columns })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Parse an update body into the tri-state patch.
///
/// Deserialization failures (malformed JSON, wrong shape, status outside the
/// closed enum) come back in the standard `{error, details}` envelope.
pub fn parse_patch_body(body: &str) -> Result<LeadPatch, AppError> {
    serde_json::from_str(body).map_err(|e| AppError::MalformedJson(e.to_string()))
}

/// PATCH /api/v1/leads/:id
///
/// Applies a tri-state partial update and returns the full reconciled row.
/// The board's quick status change posts a one-field patch through this same
/// handler; there is no separate code path for it.
///
/// The session check is the first gate: the handler takes the raw body as a
/// `String` so an unauthenticated caller never reaches the patch parser and
/// learns nothing about validation behavior.
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, AppError> {
    require_staff_session(&state.config, &headers)?;

    let patch = parse_patch_body(&body)?;

    tracing::debug!("Updating lead {}: {:?}", id, patch);
    let lead = LeadStore::new(state.db.clone()).update(id, &patch).await?;

    Ok(Json(json!({ "success": true, "data": lead })))
}
