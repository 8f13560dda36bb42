use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use siren_dispatch::SubmitAlert;
use siren_domain::{
    allowed_targets, Actor, AlertError, AlertId, AlertStatus, ErrorKind, GeoPoint,
    IncidentCategory, MedicalProfile,
};
use siren_gateway::AlertView;
use uuid::Uuid;

use crate::state::AppState;

/// An `AlertError` carried to the HTTP boundary.
///
/// The error taxonomy maps one-to-one onto status codes; the human-readable
/// reason travels in the JSON body and internals never leak.
pub struct ApiError(AlertError);

impl From<AlertError> for ApiError {
    fn from(e: AlertError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label) = match self.0.kind() {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "authorization"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::Upstream => (StatusCode::BAD_GATEWAY, "upstream"),
        };
        let body = json!({
            "error": label,
            "reason": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Actor context from the trusted gateway headers.
///
/// `x-siren-role` selects the role; `x-siren-actor` carries the identifier.
/// Reporters may omit the identifier (anonymous clients); the other roles
/// may not.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let role = headers
        .get("x-siren-role")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AlertError::Validation("missing x-siren-role header".to_string())
        })?;
    let id = headers
        .get("x-siren-actor")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match role {
        "reporter" => Ok(Actor::Reporter { reporter_id: id }),
        "dispatch" => {
            let operator_id = id.ok_or_else(|| {
                AlertError::Validation("dispatch requires x-siren-actor".to_string())
            })?;
            Ok(Actor::Dispatch { operator_id })
        }
        "unit" => {
            let unit_id = id.ok_or_else(|| {
                AlertError::Validation("unit requires x-siren-actor".to_string())
            })?;
            Ok(Actor::Unit { unit_id })
        }
        other => Err(AlertError::Validation(format!("unknown role: {other}")).into()),
    }
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub location: GeoPoint,
    pub category: IncidentCategory,
    #[serde(default)]
    pub anonymous: bool,
}

pub async fn submit_alert(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<AlertView>), ApiError> {
    let actor = actor_from_headers(&headers)?;
    let alert = state.lifecycle.submit(
        &actor,
        SubmitAlert {
            location: body.location,
            category: body.category,
            anonymous: body.anonymous,
        },
    )?;
    Ok((StatusCode::CREATED, Json(state.gateway.enrich(&alert, &actor))))
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

pub async fn cancel_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<CancelRequest>,
) -> Result<Json<AlertView>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let alert = state.lifecycle.cancel(&actor, AlertId(id), &body.reason)?;
    Ok(Json(state.gateway.enrich(&alert, &actor)))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: AlertStatus,
    pub reason: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<StatusRequest>,
) -> Result<Json<AlertView>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let alert = state.lifecycle.update_status(
        &actor,
        AlertId(id),
        body.status,
        body.reason.as_deref(),
    )?;
    Ok(Json(state.gateway.enrich(&alert, &actor)))
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub station_id: String,
    pub unit_id: String,
}

pub async fn assign_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<AssignRequest>,
) -> Result<Json<AlertView>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let alert = state
        .lifecycle
        .assign(&actor, AlertId(id), &body.station_id, &body.unit_id)?;
    Ok(Json(state.gateway.enrich(&alert, &actor)))
}

/// Role-scoped alert listing, enriched for the requesting viewer.
///
/// Dispatch sees everything; a reporter sees their own reports; a unit sees
/// its active mission.
pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<AlertView>>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let store = state.lifecycle.store();
    let alerts = match &actor {
        Actor::Dispatch { .. } => store.list_recent(),
        Actor::Reporter { reporter_id: Some(id) } => store.list_by_reporter(id),
        Actor::Reporter { reporter_id: None } => Ok(Vec::new()),
        Actor::Unit { unit_id } => {
            store.active_for_unit(unit_id).map(|m| m.into_iter().collect())
        }
    }
    .map_err(|e| AlertError::Upstream(format!("alert store: {e}")))?;
    Ok(Json(state.gateway.enrich_all(&alerts, &actor)))
}

/// The transitions the requesting actor may apply to this alert right now.
pub async fn alert_transitions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<AlertStatus>>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let alert = state
        .lifecycle
        .store()
        .get(AlertId(id))
        .map_err(|e| AlertError::Upstream(format!("alert store: {e}")))?
        .ok_or_else(|| AlertError::NotFound(format!("alert {id}")))?;
    Ok(Json(allowed_targets(&actor, &alert)))
}

/// Upsert a medical profile
///
/// A reporter may only write their own profile; dispatch may write any, for
/// operator-assisted onboarding.
pub async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(profile): Json<MedicalProfile>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let permitted = match &actor {
        Actor::Dispatch { .. } => true,
        Actor::Reporter { reporter_id: Some(id) } => *id == profile.reporter_id,
        _ => false,
    };
    if !permitted {
        return Err(AlertError::Authorization(
            "profiles may only be written by their owner or dispatch".to_string(),
        )
        .into());
    }
    state.profiles.upsert(profile);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

/// Flip a unit's advisory availability flag (dispatch-only)
pub async fn set_unit_availability(
    State(state): State<Arc<AppState>>,
    Path(unit_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AvailabilityRequest>,
) -> Result<StatusCode, ApiError> {
    let actor = actor_from_headers(&headers)?;
    if !actor.is_dispatch() {
        return Err(AlertError::Authorization(
            "only dispatch may change unit availability".to_string(),
        )
        .into());
    }
    state.directory.set_unit_available(&unit_id, body.available);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "siren-node",
        "ws_port": state.config.ws_port,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
