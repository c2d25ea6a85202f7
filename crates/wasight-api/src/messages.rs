use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use wasight_types::api::{ChatSearchQuery, FilterRequest, ScrollRequest, SessionStatus};
use wasight_types::time::{day_end_in, day_start_in};
use wasight_types::{CategoryFilter, TimeRange};
use wasight_view::layout::{DrawOp, LayoutPlan, Rect};

use crate::state::{AppState, lock};

const DEFAULT_VIEWPORT_WIDTH: u32 = 800;
const MIN_VIEWPORT_WIDTH: u32 = 120;

#[derive(Debug, Deserialize)]
pub struct ViewportQuery {
    pub width: Option<u32>,
}

/// One loaded row, laid out for the requested viewport width. `ops` are
/// positioned within the whole list, rows stacked top to bottom.
#[derive(Debug, Serialize)]
pub struct RenderedRow {
    pub index: usize,
    pub plan: LayoutPlan,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Serialize)]
pub struct ScrollResponse {
    pub start: usize,
    pub end: usize,
    pub status: SessionStatus,
}

pub async fn list_chats(
    State(state): State<AppState>,
    Query(query): Query<ChatSearchQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let mut messages = lock(&state.messages)?;
    Ok(Json(messages.search_chats(&query.search).to_vec()))
}

pub async fn select_chat(
    State(state): State<AppState>,
    Path(chat_jid): Path<String>,
) -> Result<Json<SessionStatus>, StatusCode> {
    let mut messages = lock(&state.messages)?;
    if !messages.select_chat(&chat_jid) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(messages.status()))
}

pub async fn status(State(state): State<AppState>) -> Result<Json<SessionStatus>, StatusCode> {
    Ok(Json(lock(&state.messages)?.status()))
}

/// Replace the predicate set. Missing dates fall back to the dataset extent.
pub async fn apply_filter(
    State(state): State<AppState>,
    Json(req): Json<FilterRequest>,
) -> Result<Json<SessionStatus>, StatusCode> {
    let category: CategoryFilter = req.category.parse().map_err(|e| {
        warn!("Rejected filter: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let mut messages = lock(&state.messages)?;
    let extent = messages.extent();
    let from = req.from.map(|d| day_start_in(&Local, d)).unwrap_or(extent.from);
    let to = req.to.map(|d| day_end_in(&Local, d)).unwrap_or(extent.to);
    if from > to {
        return Err(StatusCode::BAD_REQUEST);
    }

    messages.set_filters(req.text, category, TimeRange::new(from, to));
    Ok(Json(messages.status()))
}

pub async fn clear_filter(State(state): State<AppState>) -> Result<Json<SessionStatus>, StatusCode> {
    let mut messages = lock(&state.messages)?;
    messages.clear_filters();
    Ok(Json(messages.status()))
}

pub async fn scroll(
    State(state): State<AppState>,
    Json(req): Json<ScrollRequest>,
) -> Result<Json<ScrollResponse>, StatusCode> {
    let mut messages = lock(&state.messages)?;
    let grown = messages.on_scroll(req.value, req.page_step, req.maximum);
    Ok(Json(ScrollResponse {
        start: grown.start,
        end: grown.end,
        status: messages.status(),
    }))
}

pub async fn loaded_messages(
    State(state): State<AppState>,
    Query(query): Query<ViewportQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let width = query
        .width
        .unwrap_or(DEFAULT_VIEWPORT_WIDTH)
        .max(MIN_VIEWPORT_WIDTH);

    // Layout may decode thumbnails; keep it off the async runtime
    let rendered = tokio::task::spawn_blocking(move || {
        let messages = lock(&state.messages)?;
        let mut renderer = lock(&state.renderer)?;

        let mut y = 0;
        let mut rows = Vec::with_capacity(messages.pager().loaded());
        for (index, row) in messages.pager().loaded_rows().iter().enumerate() {
            let plan = renderer.layout(row, width);
            let bounds = Rect {
                x: 0,
                y,
                width,
                height: plan.height,
            };
            let mut ops = Vec::new();
            renderer.paint(&plan, bounds, &mut ops);
            y += plan.height;
            rows.push(RenderedRow { index, plan, ops });
        }
        Ok::<_, StatusCode>(rows)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(Json(rendered))
}

/// Double-click on a loaded row. Runs the row's effect, if it has one.
pub async fn open_row(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Response, StatusCode> {
    let effect = lock(&state.messages)?
        .on_double_click(index)
        .map_err(|e| {
            warn!("{}", e);
            StatusCode::NOT_FOUND
        })?;

    let Some(effect) = effect else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    // The launcher waits on the platform handler
    let opener = state.opener.clone();
    let effect = tokio::task::spawn_blocking(move || match opener.open(&effect) {
        Ok(()) => Ok(effect),
        Err(e) => {
            error!("Failed to open {:?}: {}", effect, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;
    Ok(Json(effect).into_response())
}

pub async fn thumbnail(
    State(state): State<AppState>,
    Path(row_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let png = tokio::task::spawn_blocking(move || {
        let stored = {
            let messages = lock(&state.messages)?;
            messages
                .table()
                .get(row_id)
                .and_then(|row| row.media_path())
                .map(str::to_string)
                .ok_or(StatusCode::NOT_FOUND)?
        };
        let thumb = lock(&state.renderer)?
            .thumbnails_mut()
            .get(row_id, &stored)
            .ok_or(StatusCode::NOT_FOUND)?;
        thumb.to_png().map_err(|e| {
            error!("Thumbnail for row {}: {}", row_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
