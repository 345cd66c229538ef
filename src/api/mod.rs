use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::board::Poller;
use crate::error::FeedError;

#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<Poller>,
}

#[derive(Debug, Deserialize)]
pub struct SelectedDate {
    pub date: NaiveDate,
}

/// Build the Axum router for the scoreboard feed.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/scoreboard", get(scoreboard_handler))
        .route("/api/timings", get(timings_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/selected-date", put(selected_date_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn refresh_error(err: FeedError) -> (StatusCode, String) {
    let status = match &err {
        FeedError::Cancelled => StatusCode::CONFLICT,
        FeedError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        e if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// GET /api/scoreboard
async fn scoreboard_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.poller.refresher().board().current())
}

/// GET /api/timings
async fn timings_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.poller.refresher().timings().await)
}

/// POST /api/refresh
async fn refresh_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .poller
        .refresh_now()
        .await
        .map(Json)
        .map_err(refresh_error)
}

/// PUT /api/selected-date  {"date": "2026-02-09"}
async fn selected_date_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectedDate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .poller
        .set_selected_date(body.date)
        .await
        .map(Json)
        .map_err(refresh_error)
}
