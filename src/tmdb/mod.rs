//! Catalog metadata provider.
//!
//! Handlers only see the [`MetadataService`] trait; [`TmdbClient`] is the
//! production implementation. Payloads stay as raw JSON so catalog fields
//! reach the client untouched.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::users::SearchKind;

mod client;

pub use client::TmdbClient;

/// Browsable media collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TmdbError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("{path} returned status {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Remote catalog of movies, shows and people.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Free-text search, first page only.
    async fn search(&self, kind: SearchKind, query: &str) -> Result<Vec<Value>, TmdbError>;

    /// Today's trending titles.
    async fn trending(&self, media: MediaType) -> Result<Vec<Value>, TmdbError>;

    async fn details(&self, media: MediaType, id: u64) -> Result<Value, TmdbError>;

    async fn similar(&self, media: MediaType, id: u64) -> Result<Vec<Value>, TmdbError>;

    /// Lists such as `popular` or `top_rated`.
    async fn by_category(&self, media: MediaType, category: &str)
        -> Result<Vec<Value>, TmdbError>;

    /// Videos attached to a title.
    async fn trailers(&self, media: MediaType, id: u64) -> Result<Vec<Value>, TmdbError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
