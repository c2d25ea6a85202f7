use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use wasight_types::TimeRange;
use wasight_types::api::{ContactFilterRequest, RangeRequest, SelectionRequest};
use wasight_view::locations::{ContactEntry, MapCommand, MarkerDetail, PositionRow};

use crate::state::{AppState, lock};

#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub extent: TimeRange,
    pub range: TimeRange,
}

pub async fn contacts(State(state): State<AppState>) -> Result<Json<Vec<ContactEntry>>, StatusCode> {
    Ok(Json(lock(&state.locations)?.contacts()))
}

/// Narrow the contact list. Contacts filtered out are unchecked.
pub async fn filter_contacts(
    State(state): State<AppState>,
    Json(req): Json<ContactFilterRequest>,
) -> Result<Json<Vec<ContactEntry>>, StatusCode> {
    let mut locations = lock(&state.locations)?;
    locations.set_contact_filter(&req.filter);
    Ok(Json(locations.contacts()))
}

/// Change the checked contacts; answers with the map commands to replay.
pub async fn selection(
    State(state): State<AppState>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<Vec<MapCommand>>, StatusCode> {
    let mut locations = lock(&state.locations)?;
    match req {
        SelectionRequest::Check { number, checked } => {
            if !locations.check(&number, checked) {
                return Err(StatusCode::NOT_FOUND);
            }
        }
        SelectionRequest::SelectAll => locations.select_all(),
        SelectionRequest::Clear => locations.clear_selection(),
    }
    Ok(Json(locations.commands()))
}

pub async fn range(State(state): State<AppState>) -> Result<Json<RangeResponse>, StatusCode> {
    let locations = lock(&state.locations)?;
    Ok(Json(RangeResponse {
        extent: locations.extent(),
        range: locations.range(),
    }))
}

pub async fn set_range(
    State(state): State<AppState>,
    Json(req): Json<RangeRequest>,
) -> Result<Json<Vec<MapCommand>>, StatusCode> {
    if req.from > req.to {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut locations = lock(&state.locations)?;
    locations.set_range(TimeRange::new(req.from, req.to));
    Ok(Json(locations.commands()))
}

pub async fn commands(State(state): State<AppState>) -> Result<Json<Vec<MapCommand>>, StatusCode> {
    Ok(Json(lock(&state.locations)?.commands()))
}

pub async fn positions(State(state): State<AppState>) -> Result<Json<Vec<PositionRow>>, StatusCode> {
    Ok(Json(lock(&state.locations)?.positions()))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MarkerDetail>, StatusCode> {
    lock(&state.locations)?
        .detail(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn highlight(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MapCommand>, StatusCode> {
    lock(&state.locations)?
        .highlight(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Extra marker where the live share on row `id` ended.
pub async fn final_marker(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MapCommand>, StatusCode> {
    lock(&state.locations)?
        .final_marker(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
