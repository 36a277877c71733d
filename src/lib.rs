//! HTTP backend for a movie and TV browsing app: cookie sessions, TMDB
//! search and browse proxies, and per-user search history.

pub mod app;
pub mod auth;
pub mod browse;
pub mod config;
pub mod dto;
pub mod error;
pub mod random;
pub mod search;
pub mod state;
pub mod tmdb;
pub mod users;

pub use app::build_app;
pub use state::AppState;
