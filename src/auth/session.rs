use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::config::CookieConfig;

fn base_cookie(cfg: &CookieConfig, value: String) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(cfg.secure)
        .build()
}

/// Signs a token for `user_id` and attaches it to `jar` as the session cookie.
pub fn issue(
    jar: CookieJar,
    keys: &JwtKeys,
    cfg: &CookieConfig,
    user_id: Uuid,
) -> anyhow::Result<CookieJar> {
    let token = keys.sign(user_id)?;
    let mut cookie = base_cookie(cfg, token);
    cookie.set_max_age(keys.ttl);
    Ok(jar.add(cookie))
}

/// Expires the session cookie, whether or not the client sent one.
pub fn clear(jar: CookieJar, cfg: &CookieConfig) -> CookieJar {
    let mut cookie = base_cookie(cfg, String::new());
    cookie.make_removal();
    jar.add(cookie)
}

/// Session token from the cookie, or from `Authorization: Bearer` as a fallback.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(c) = jar.get(cookie_name) {
        if !c.value().is_empty() {
            return Some(c.value().to_string());
        }
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
