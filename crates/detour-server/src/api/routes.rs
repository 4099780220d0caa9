//! REST API routes.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use detour_core::{
    presets, resolve_location, Coordinate, HazardZone, PlanOutcome, RouteError, RoutePlanRequest,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::session::{SessionInputs, SessionPatch, SessionSnapshot};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/locations", get(list_locations))
        .route("/v1/hazards", get(list_hazards).put(replace_hazards))
        .route("/v1/route/plan", post(plan_route))
        .route("/v1/sessions", get(list_sessions).post(create_session))
        .route(
            "/v1/sessions/:id",
            get(get_session).patch(patch_session).delete(delete_session),
        )
}

/// A location given as coordinates, `"lat, lng"` text or a preset name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Coordinate(Coordinate),
    Text(String),
}

impl LocationInput {
    fn resolve(self) -> Result<Coordinate, RouteError> {
        match self {
            LocationInput::Coordinate(coordinate) if coordinate.is_finite() => Ok(coordinate),
            LocationInput::Coordinate(_) => {
                Err(RouteError::invalid_input("coordinate is not finite"))
            }
            LocationInput::Text(text) => resolve_location(&text),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlanRouteBody {
    pub source: LocationInput,
    pub destination: LocationInput,
    #[serde(default, alias = "avoid_issues")]
    pub avoid_hazards: bool,
    /// Defaults to the live hazard feed.
    #[serde(default)]
    pub hazards: Option<Vec<HazardZone>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionBody {
    #[serde(default)]
    pub source: Option<LocationInput>,
    #[serde(default)]
    pub destination: Option<LocationInput>,
    #[serde(default)]
    pub avoid_hazards: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchSessionBody {
    #[serde(default)]
    pub source: Option<LocationInput>,
    #[serde(default)]
    pub destination: Option<LocationInput>,
    #[serde(default)]
    pub source_text: Option<String>,
    #[serde(default)]
    pub destination_text: Option<String>,
    #[serde(default)]
    pub avoid_hazards: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub wait: bool,
}

async fn list_locations() -> impl IntoResponse {
    Json(presets::preset_locations())
}

async fn list_hazards(State(state): State<Arc<AppState>>) -> Json<Vec<HazardZone>> {
    Json(state.hazards())
}

async fn replace_hazards(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Vec<HazardZone>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(hazards) = body?;
    let count = hazards.len();
    let restarted = state.replace_hazards(hazards)?;
    Ok(Json(json!({
        "hazards": count,
        "sessions_restarted": restarted,
    })))
}

async fn plan_route(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PlanRouteBody>, JsonRejection>,
) -> Result<Json<PlanOutcome>, ApiError> {
    let Json(body) = body?;
    let request = RoutePlanRequest {
        source: body.source.resolve()?,
        destination: body.destination.resolve()?,
        hazards: body.hazards.unwrap_or_else(|| state.hazards()),
        avoid_hazards: body.avoid_hazards,
    };
    let outcome = state.planner().plan(request).await?;
    Ok(Json(outcome))
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionSnapshot>> {
    Json(state.list_sessions())
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateSessionBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let inputs = SessionInputs {
        source: match body.source {
            Some(source) => source.resolve()?,
            None => presets::default_source(),
        },
        destination: match body.destination {
            Some(destination) => destination.resolve()?,
            None => presets::default_destination(),
        },
        avoid_hazards: body.avoid_hazards.unwrap_or(false),
    };
    let session = state.create_session(inputs)?;
    Ok((StatusCode::CREATED, Json(session.snapshot())))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state
        .get_session(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    if query.wait && !session.wait_settled(state.config().cycle_deadline()).await {
        tracing::debug!("Session {} still loading after wait", id);
    }
    Ok(Json(session.snapshot()))
}

async fn patch_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<PatchSessionBody>, JsonRejection>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let Json(body) = body?;
    let session = state
        .get_session(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;

    // Resolve everything before touching the session so a bad field changes nothing.
    let patch = SessionPatch {
        source: resolve_field(body.source, body.source_text)?,
        destination: resolve_field(body.destination, body.destination_text)?,
        avoid_hazards: body.avoid_hazards,
    };
    if patch.is_empty() {
        return Ok(Json(session.snapshot()));
    }

    state
        .patch_session(&id, patch)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    Ok(Json(session.snapshot()))
}

/// Text entry wins over a structured location when both are given.
fn resolve_field(
    location: Option<LocationInput>,
    text: Option<String>,
) -> Result<Option<Coordinate>, RouteError> {
    match (text, location) {
        (Some(text), _) => resolve_location(&text).map(Some),
        (None, Some(location)) => location.resolve().map(Some),
        (None, None) => Ok(None),
    }
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.remove_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(id))
    }
}
