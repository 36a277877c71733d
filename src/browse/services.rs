use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult},
    random::{choose, RandomSource},
    tmdb::{MediaType, MetadataService, TmdbError},
};

/// Catalog ids are plain decimal digits; `u64::from_str` alone would also take a leading `+`.
pub(crate) fn parse_id(raw: &str) -> AppResult<u64> {
    let digits_only = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
    digits_only
        .then(|| raw.parse::<u64>().ok())
        .flatten()
        .ok_or_else(|| {
            warn!(%raw, "catalog id is not an integer");
            AppError::Validation("Invalid id".into())
        })
}

pub(crate) fn validate_category(raw: &str) -> AppResult<&str> {
    lazy_static! {
        static ref CATEGORY_RE: Regex = Regex::new(r"^[a-z_]+$").unwrap();
    }
    if CATEGORY_RE.is_match(raw) {
        Ok(raw)
    } else {
        warn!(%raw, "invalid category");
        Err(AppError::Validation("Invalid category".into()))
    }
}

/// Remote 404 becomes a local 404 with no body; anything else is an upstream failure.
fn not_found_as_empty(e: TmdbError) -> AppError {
    match e {
        TmdbError::NotFound(path) => {
            debug!(%path, "catalog resource not found");
            AppError::EmptyNotFound
        }
        other => AppError::Upstream(other),
    }
}

/// One title picked at random from today's trending list.
pub async fn random_trending(
    catalog: &dyn MetadataService,
    random: &dyn RandomSource,
    media: MediaType,
) -> AppResult<Value> {
    let results = catalog.trending(media).await.map_err(not_found_as_empty)?;
    choose(random, &results)
        .cloned()
        .ok_or(AppError::EmptyNotFound)
}

pub async fn details(catalog: &dyn MetadataService, media: MediaType, raw_id: &str) -> AppResult<Value> {
    let id = parse_id(raw_id)?;
    catalog.details(media, id).await.map_err(not_found_as_empty)
}

pub async fn similar(
    catalog: &dyn MetadataService,
    media: MediaType,
    raw_id: &str,
) -> AppResult<Vec<Value>> {
    let id = parse_id(raw_id)?;
    catalog.similar(media, id).await.map_err(not_found_as_empty)
}

pub async fn trailers(
    catalog: &dyn MetadataService,
    media: MediaType,
    raw_id: &str,
) -> AppResult<Vec<Value>> {
    let id = parse_id(raw_id)?;
    catalog.trailers(media, id).await.map_err(not_found_as_empty)
}

pub async fn by_category(
    catalog: &dyn MetadataService,
    media: MediaType,
    raw_category: &str,
) -> AppResult<Vec<Value>> {
    let category = validate_category(raw_category)?;
    catalog
        .by_category(media, category)
        .await
        .map_err(not_found_as_empty)
}
