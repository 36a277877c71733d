use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::Value;
use tracing::instrument;

use super::services;
use crate::{
    auth::CurrentUser,
    dto::{ContentResponse, MessageResponse},
    error::AppResult,
    state::AppState,
    users::{HistoryEntry, SearchKind},
};

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search/person/:query", get(search_person))
        .route("/search/movie/:query", get(search_movie))
        .route("/search/tv/:query", get(search_tv))
        .route("/search/history", get(get_search_history))
        .route("/search/history/:id", delete(remove_item_from_search_history))
}

async fn search_kind(
    state: &AppState,
    user: &CurrentUser,
    kind: SearchKind,
    query: &str,
) -> AppResult<Json<ContentResponse<Vec<Value>>>> {
    let results = services::search_and_record(
        state.users.as_ref(),
        state.catalog.as_ref(),
        user.0.id,
        kind,
        query,
    )
    .await?;
    Ok(Json(ContentResponse::ok(results)))
}

#[instrument(skip(state, user))]
pub async fn search_person(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(query): Path<String>,
) -> AppResult<Json<ContentResponse<Vec<Value>>>> {
    search_kind(&state, &user, SearchKind::Person, &query).await
}

#[instrument(skip(state, user))]
pub async fn search_movie(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(query): Path<String>,
) -> AppResult<Json<ContentResponse<Vec<Value>>>> {
    search_kind(&state, &user, SearchKind::Movie, &query).await
}

#[instrument(skip(state, user))]
pub async fn search_tv(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(query): Path<String>,
) -> AppResult<Json<ContentResponse<Vec<Value>>>> {
    search_kind(&state, &user, SearchKind::Tv, &query).await
}

#[instrument(skip_all)]
pub async fn get_search_history(
    CurrentUser(user): CurrentUser,
) -> Json<ContentResponse<Vec<HistoryEntry>>> {
    Json(ContentResponse::ok(user.search_history))
}

#[instrument(skip(state, user))]
pub async fn remove_item_from_search_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    services::remove_entry(state.users.as_ref(), user.id, &id).await?;
    Ok(Json(MessageResponse::ok("Item removed from search history")))
}
