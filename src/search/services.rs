use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    tmdb::{MetadataService, TmdbError},
    users::{HistoryEntry, SearchKind, UserStore},
};

/// Builds the history entry for a search from its top result.
///
/// People carry `name`/`profile_path`, movies `title`/`poster_path`,
/// shows `name`/`poster_path`.
pub fn entry_from_top_result(
    kind: SearchKind,
    top: &Value,
    now: OffsetDateTime,
) -> Result<HistoryEntry, TmdbError> {
    let id = top
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| TmdbError::Malformed(format!("{kind} result without numeric id")))?;

    let (title_field, image_field) = match kind {
        SearchKind::Person => ("name", "profile_path"),
        SearchKind::Movie => ("title", "poster_path"),
        SearchKind::Tv => ("name", "poster_path"),
    };

    Ok(HistoryEntry {
        id,
        image: top
            .get(image_field)
            .and_then(Value::as_str)
            .map(str::to_owned),
        title: top
            .get(title_field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        search_type: kind,
        created_at: now,
    })
}

/// Runs the search and records only the first result in the caller's history.
pub async fn search_and_record(
    store: &dyn UserStore,
    catalog: &dyn MetadataService,
    user_id: Uuid,
    kind: SearchKind,
    query: &str,
) -> AppResult<Vec<Value>> {
    let results = catalog.search(kind, query).await?;

    let Some(top) = results.first() else {
        info!(%kind, %query, "search returned no results");
        return Err(AppError::EmptyNotFound);
    };

    let entry = entry_from_top_result(kind, top, OffsetDateTime::now_utc())?;
    store.push_history(user_id, entry).await?;

    info!(%kind, %user_id, count = results.len(), "search recorded");
    Ok(results)
}

/// Leading integer of `raw`: optional whitespace and sign, then digits up to the
/// first non-digit. `"268abc"` is 268; `"abc"` has none.
pub(crate) fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let magnitude = rest[..end].parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Removes every history entry with the given catalog id and returns how many
/// went. Ids that match nothing, or carry no leading integer, remove nothing.
pub async fn remove_entry(store: &dyn UserStore, user_id: Uuid, raw_id: &str) -> AppResult<u64> {
    let Some(external_id) = leading_integer(raw_id) else {
        debug!(%raw_id, "history id has no integer prefix; nothing to remove");
        return Ok(0);
    };
    let removed = store.pull_history(user_id, external_id).await?;
    info!(%user_id, external_id, removed, "history entries removed");
    Ok(removed)
}
