use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::services;
use crate::{
    auth::CurrentUser,
    dto::ContentResponse,
    error::AppResult,
    state::AppState,
    tmdb::MediaType,
};

#[derive(Debug, Serialize)]
pub struct TrailersResponse {
    pub success: bool,
    pub trailers: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub success: bool,
    pub similar: Vec<Value>,
}

/// Browse routes for one media type; mount under `/tv` or `/movie`.
pub fn browse_routes(media: MediaType) -> Router<AppState> {
    // `:id` doubles as the category name on the last route; the router needs
    // one parameter name per segment position.
    Router::new()
        .route("/trending", get(get_trending))
        .route("/:id/trailers", get(get_trailers))
        .route("/:id/details", get(get_details))
        .route("/:id/similar", get(get_similar))
        .route("/:id", get(get_by_category))
        .layer(Extension(media))
}

#[instrument(skip(state, _user))]
pub async fn get_trending(
    State(state): State<AppState>,
    Extension(media): Extension<MediaType>,
    _user: CurrentUser,
) -> AppResult<Json<ContentResponse<Value>>> {
    let pick =
        services::random_trending(state.catalog.as_ref(), state.random.as_ref(), media).await?;
    Ok(Json(ContentResponse::ok(pick)))
}

#[instrument(skip(state, _user))]
pub async fn get_trailers(
    State(state): State<AppState>,
    Extension(media): Extension<MediaType>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<TrailersResponse>> {
    let trailers = services::trailers(state.catalog.as_ref(), media, &id).await?;
    Ok(Json(TrailersResponse {
        success: true,
        trailers,
    }))
}

#[instrument(skip(state, _user))]
pub async fn get_details(
    State(state): State<AppState>,
    Extension(media): Extension<MediaType>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ContentResponse<Value>>> {
    let details = services::details(state.catalog.as_ref(), media, &id).await?;
    Ok(Json(ContentResponse::ok(details)))
}

#[instrument(skip(state, _user))]
pub async fn get_similar(
    State(state): State<AppState>,
    Extension(media): Extension<MediaType>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<SimilarResponse>> {
    let similar = services::similar(state.catalog.as_ref(), media, &id).await?;
    Ok(Json(SimilarResponse {
        success: true,
        similar,
    }))
}

#[instrument(skip(state, _user))]
pub async fn get_by_category(
    State(state): State<AppState>,
    Extension(media): Extension<MediaType>,
    _user: CurrentUser,
    Path(category): Path<String>,
) -> AppResult<Json<ContentResponse<Vec<Value>>>> {
    let content = services::by_category(state.catalog.as_ref(), media, &category).await?;
    Ok(Json(ContentResponse::ok(content)))
}
