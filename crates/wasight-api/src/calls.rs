use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::error;

use wasight_types::api::{PointerRequest, StarQuery};
use wasight_view::calls::StarDiagram;
use wasight_view::export::DetailTable;

use crate::state::{AppState, lock};

#[derive(Debug, Serialize)]
pub struct PointerResponse {
    pub selected: Option<String>,
    pub dragging: bool,
    pub diagram: StarDiagram,
    /// Set on double-click when a node has been selected.
    pub detail: Option<DetailTable>,
}

/// Current star diagram; `search` and `top` relayout it when given.
pub async fn star(
    State(state): State<AppState>,
    Query(query): Query<StarQuery>,
) -> Result<Json<StarDiagram>, StatusCode> {
    let mut calls = lock(&state.calls)?;
    if let Some(search) = &query.search {
        calls.set_search(search);
    }
    if let Some(top) = query.top {
        calls.set_top_n(top);
    }
    Ok(Json(calls.diagram().clone()))
}

pub async fn pointer(
    State(state): State<AppState>,
    Json(req): Json<PointerRequest>,
) -> Result<Json<PointerResponse>, StatusCode> {
    let mut calls = lock(&state.calls)?;
    let detail = match req {
        PointerRequest::Press { x, y } => {
            calls.press(x, y);
            None
        }
        PointerRequest::Move { x, y } => {
            calls.move_to(x, y);
            None
        }
        PointerRequest::Release => {
            calls.release();
            None
        }
        PointerRequest::DoubleClick => calls.double_click(),
    };

    Ok(Json(PointerResponse {
        selected: calls.selected().map(str::to_string),
        dragging: calls.is_dragging(),
        diagram: calls.diagram().clone(),
        detail,
    }))
}

fn detail_for(state: &AppState, jid: &str) -> Result<DetailTable, StatusCode> {
    let detail = lock(&state.calls)?.detail(jid);
    if detail.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(detail)
}

pub async fn detail(
    State(state): State<AppState>,
    Path(jid): Path<String>,
) -> Result<Json<DetailTable>, StatusCode> {
    Ok(Json(detail_for(&state, &jid)?))
}

/// The detail table as a CSV download.
pub async fn export_csv(
    State(state): State<AppState>,
    Path(jid): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let detail = detail_for(&state, &jid)?;
    let mut body = Vec::new();
    detail.write_csv(&mut body).map_err(|e| {
        error!("CSV export for {}: {}", jid, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let disposition = format!("attachment; filename=\"calls_{}.csv\"", jid.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
