use crate::config::Config;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{LeadStatus, NewLead};
use crate::store::LeadStore;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the shared intake secret.
pub const SECRET_HEADER: &str = "x-select-therapy-key";

/// Response for a successful intake call. Only the generated identifier is
/// echoed back; no other lead fields leave the system on this path.
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub success: bool,
    pub lead_id: Uuid,
    pub message: String,
}

/// Lead intake webhook handler.
///
/// Receives untrusted JSON payloads from the external referral caller,
/// authenticated by the `x-select-therapy-key` shared-secret header.
///
/// The processing order is a contract, not an implementation detail: the
/// secret check runs strictly before any body parsing, so malformed bodies
/// from unauthenticated callers never reach the parser. The handler takes the
/// raw body as a `String` rather than a typed `Json` extractor for exactly
/// this reason.
pub async fn lead_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<IntakeResponse>), AppError> {
    tracing::info!("Received lead intake webhook");

    // 1. Authenticate before touching the body
    authenticate(&state.config, &headers)?;

    // 2-6. Parse, validate, normalize
    let new_lead = parse_intake_body(&body)?;

    // 7. Single insert; nothing is written on any rejection path above
    let lead_id = LeadStore::new(state.db.clone()).insert(&new_lead).await?;

    Ok((
        StatusCode::OK,
        Json(IntakeResponse {
            success: true,
            lead_id,
            message: "Lead created successfully".to_string(),
        }),
    ))
}

/// Validate the shared-secret header against the configured value.
///
/// No configured secret is a deployment defect and fails closed with a
/// configuration error, distinct from an auth failure. Both sides are trimmed
/// before comparison; the provided value is never logged.
pub fn authenticate(config: &Config, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = config
        .webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Config("Webhook secret not set".to_string()))?;

    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized(format!("Invalid or missing {} header", SECRET_HEADER))
        })?;

    if !constant_time_compare(provided.trim(), expected.trim()) {
        return Err(AppError::Unauthorized(format!(
            "Invalid or missing {} header",
            SECRET_HEADER
        )));
    }

    Ok(())
}

/// Constant-time string comparison (basic implementation)
/// For production, consider using a crypto library like `subtle`
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Parse and validate a raw intake body into the canonical creation record.
///
/// Each step short-circuits: body presence, syntactic parse (parser message
/// preserved for diagnosability), object shape, required fields (first
/// failure wins, reported per-field), then normalization.
pub fn parse_intake_body(body: &str) -> Result<NewLead, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::EmptyBody);
    }

    let parsed: Value =
        serde_json::from_str(body).map_err(|e| AppError::MalformedJson(e.to_string()))?;

    let obj = match &parsed {
        Value::Object(map) => map,
        other => {
            return Err(AppError::WrongShape(format!(
                "Request body must be a JSON object, got {}",
                json_kind(other)
            )))
        }
    };

    let patient_name = required_field(obj, "patient_name")?;
    let phone_number = required_field(obj, "phone_number")?;

    let status = match optional_field(obj, "status")? {
        None => LeadStatus::New,
        Some(raw) => LeadStatus::parse(&raw).ok_or_else(|| AppError::InvalidField {
            field: "status",
            details: format!(
                "must be one of New, Contacted, Booked, Cancelled, Archived (got '{}')",
                raw
            ),
        })?,
    };

    Ok(NewLead {
        patient_name,
        phone_number,
        dob: optional_field(obj, "dob")?,
        pain_reason: optional_field(obj, "pain_reason")?,
        insurance: optional_field(obj, "insurance")?,
        location: optional_field(obj, "location")?,
        scheduling_prefs: optional_field(obj, "scheduling_prefs")?,
        status,
        notes: optional_field(obj, "notes")?,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A required field must be present, a JSON string, and non-empty after
/// trimming. Anything else is reported as missing for that specific field.
fn required_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, AppError> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(AppError::MissingField(field)),
    }
}

/// An optional field is coerced to its trimmed string representation.
/// Absent or falsy values (null, false, 0, empty/whitespace string) become
/// `None`; an empty string is never stored. Non-scalar values are rejected.
fn optional_field(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, AppError> {
    let Some(value) = obj.get(field) else {
        return Ok(None);
    };

    match value {
        Value::Null => Ok(None),
        Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some("true".to_string())),
        Value::Number(n) => {
            if n.as_f64() == Some(0.0) {
                Ok(None)
            } else {
                Ok(Some(n.to_string()))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Value::Array(_) | Value::Object(_) => Err(AppError::InvalidField {
            field,
            details: "must be a JSON scalar (string, number, boolean, or null)".to_string(),
        }),
    }
}
