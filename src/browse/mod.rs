use crate::{state::AppState, tmdb::MediaType};
use axum::Router;

pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/tv", handlers::browse_routes(MediaType::Tv))
        .nest("/movie", handlers::browse_routes(MediaType::Movie))
}
