use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use cinebrowse::{
    auth::jwt::JwtKeys,
    build_app,
    config::AppConfig,
    random::FixedIndex,
    tmdb::{MediaType, MetadataService, TmdbError},
    users::{
        HistoryEntry, MemoryUserStore, NewUser, SearchKind, StoreError, UniqueField, User,
        UserStore,
    },
    AppState,
};
use uuid::Uuid;

/// Canned catalog: "batman" finds two titles of any kind, everything else finds nothing.
struct StubCatalog;

#[async_trait]
impl MetadataService for StubCatalog {
    async fn search(&self, kind: SearchKind, query: &str) -> Result<Vec<Value>, TmdbError> {
        if query != "batman" {
            return Ok(Vec::new());
        }
        Ok(match kind {
            SearchKind::Person => vec![json!({ "id": 3894, "name": "Christian Bale", "profile_path": "/cb.jpg" })],
            SearchKind::Movie => vec![
                json!({ "id": 268, "title": "Batman", "poster_path": "/b89.jpg" }),
                json!({ "id": 272, "title": "Batman Begins", "poster_path": "/bb.jpg" }),
            ],
            SearchKind::Tv => vec![json!({ "id": 2098, "name": "Batman: The Animated Series", "poster_path": null })],
        })
    }

    async fn trending(&self, _media: MediaType) -> Result<Vec<Value>, TmdbError> {
        Ok(vec![json!({ "id": 1 }), json!({ "id": 2 }), json!({ "id": 3 })])
    }

    async fn details(&self, media: MediaType, id: u64) -> Result<Value, TmdbError> {
        if id == 404 {
            return Err(TmdbError::NotFound(format!("/{media}/{id}")));
        }
        Ok(json!({ "id": id, "media": media.as_str() }))
    }

    async fn similar(&self, _media: MediaType, id: u64) -> Result<Vec<Value>, TmdbError> {
        Ok(vec![json!({ "id": id + 1 })])
    }

    async fn by_category(&self, _media: MediaType, category: &str) -> Result<Vec<Value>, TmdbError> {
        Ok(vec![json!({ "category": category })])
    }

    async fn trailers(&self, _media: MediaType, id: u64) -> Result<Vec<Value>, TmdbError> {
        if id == 500 {
            return Err(TmdbError::Malformed("broken".into()));
        }
        Ok(vec![json!({ "key": "abc", "site": "YouTube" })])
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn test_app() -> (Router, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::from_parts(
        store.clone(),
        Arc::new(StubCatalog),
        Arc::new(FixedIndex(2)),
        Arc::new(AppConfig::for_tests()),
    );
    (build_app(state), store)
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    /// `name=value` pair of the session cookie set by this response.
    fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("jwt-netflix="))
            .map(|v| v.split(';').next().unwrap_or_default().to_string())
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    Reply { status, headers, body }
}

async fn signup_alice(app: &Router) -> String {
    let reply = send(
        app,
        Method::POST,
        "/api/v1/auth/signup",
        Some(json!({ "email": "a@b.com", "password": "secret1", "username": "alice" })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.session_cookie().expect("session cookie")
}

#[tokio::test]
async fn health_check() {
    let (app, _) = test_app();
    let reply = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, b"ok");
}

#[tokio::test]
async fn signup_then_login_scenario() {
    let (app, _) = test_app();

    let reply = send(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        Some(json!({ "email": "a@b.com", "password": "secret1", "username": "alice" })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let body = reply.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["password"], "");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["image"], "/avatar3.png");
    assert!(body["user"]["searchHistory"].as_array().unwrap().is_empty());
    let set_cookie = reply.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));

    let reply = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        Some(json!({ "email": "a@b.com", "password": "wrong" })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "success": false, "message": "Invalid credentials" }));
    assert!(reply.session_cookie().is_none());

    let reply = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        Some(json!({ "email": "a@b.com", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["user"]["password"], "");
    let cookie = reply.session_cookie().expect("new session cookie");

    let reply = send(&app, Method::GET, "/api/v1/auth/authCheck", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["user"]["email"], "a@b.com");
}

#[tokio::test]
async fn login_unknown_email_is_404() {
    let (app, _) = test_app();
    let reply = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        Some(json!({ "email": "nobody@b.com", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["message"], "Invalid credentials");
}

#[tokio::test]
async fn duplicate_email_does_not_create_second_user() {
    let (app, store) = test_app();
    signup_alice(&app).await;

    let reply = send(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        Some(json!({ "email": "a@b.com", "password": "another1", "username": "bob" })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "Email already exists");
    assert!(reply.session_cookie().is_none());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn short_password_and_bad_body_are_rejected() {
    let (app, store) = test_app();

    let reply = send(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        Some(json!({ "email": "a@b.com", "password": "12345", "username": "alice" })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["success"], false);

    let reply = send(&app, Method::POST, "/api/v1/auth/signup", Some(json!({})), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "All fields are required");

    let reply = send(
        &app,
        Method::POST,
        "/api/v1/auth/signup",
        Some(json!({ "email": "a@b.com", "password": null, "username": "alice" })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "success": false, "message": "All fields are required" }));

    let reply = send(&app, Method::POST, "/api/v1/auth/signup", None, None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "success": false, "message": "Invalid request body" }));

    let reply = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        Some(json!({ "email": "a@b.com", "password": 42 })),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "Invalid request body");

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn protected_routes_require_a_valid_session() {
    let (app, _) = test_app();

    let reply = send(&app, Method::GET, "/api/v1/search/history", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["message"], "Unauthorized - No Token Provided");

    let reply = send(&app, Method::GET, "/api/v1/tv/trending", None, Some("jwt-netflix=garbage")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["message"], "Unauthorized - Invalid Token");
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let (app, _) = test_app();
    let cookie = signup_alice(&app).await;

    let reply = send(&app, Method::POST, "/api/v1/auth/logout", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["success"], true);
    let set_cookie = reply.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("jwt-netflix=;"));
    assert!(set_cookie.contains("Max-Age=0"));
    let cleared = reply.session_cookie().unwrap();

    let reply = send(&app, Method::GET, "/api/v1/auth/authCheck", None, Some(&cleared)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    // Without any cookie logout still succeeds.
    let reply = send(&app, Method::POST, "/api/v1/auth/logout", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn search_records_top_result_and_history_can_be_pruned() {
    let (app, _) = test_app();
    let cookie = signup_alice(&app).await;

    let reply = send(&app, Method::GET, "/api/v1/search/movie/batman", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["content"].as_array().unwrap().len(), 2);

    let reply = send(&app, Method::GET, "/api/v1/search/history", None, Some(&cookie)).await;
    let history = reply.json()["content"].as_array().unwrap().clone();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], 268);
    assert_eq!(history[0]["title"], "Batman");
    assert_eq!(history[0]["searchType"], "movie");

    let reply = send(&app, Method::DELETE, "/api/v1/search/history/999", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let reply = send(&app, Method::GET, "/api/v1/search/history", None, Some(&cookie)).await;
    assert_eq!(reply.json()["content"].as_array().unwrap().len(), 1);

    let reply = send(&app, Method::DELETE, "/api/v1/search/history/268", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["message"], "Item removed from search history");
    let reply = send(&app, Method::GET, "/api/v1/search/history", None, Some(&cookie)).await;
    assert!(reply.json()["content"].as_array().unwrap().is_empty());

    let reply = send(&app, Method::DELETE, "/api/v1/search/history/abc", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["message"], "Item removed from search history");
}

#[tokio::test]
async fn history_removal_uses_the_leading_integer_of_the_id() {
    let (app, _) = test_app();
    let cookie = signup_alice(&app).await;
    send(&app, Method::GET, "/api/v1/search/movie/batman", None, Some(&cookie)).await;

    let reply = send(&app, Method::DELETE, "/api/v1/search/history/268abc", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = send(&app, Method::GET, "/api/v1/search/history", None, Some(&cookie)).await;
    assert!(reply.json()["content"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_kinds_map_their_own_fields() {
    let (app, store) = test_app();
    let cookie = signup_alice(&app).await;

    send(&app, Method::GET, "/api/v1/search/person/batman", None, Some(&cookie)).await;
    send(&app, Method::GET, "/api/v1/search/tv/batman", None, Some(&cookie)).await;

    let user = store.find_by_email("a@b.com").await.unwrap().unwrap();
    let history = user.search_history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].search_type, SearchKind::Person);
    assert_eq!(history[0].title, "Christian Bale");
    assert_eq!(history[0].image.as_deref(), Some("/cb.jpg"));
    assert_eq!(history[1].search_type, SearchKind::Tv);
    assert_eq!(history[1].image, None);
}

#[tokio::test]
async fn search_without_results_is_empty_404() {
    let (app, store) = test_app();
    let cookie = signup_alice(&app).await;

    let reply = send(&app, Method::GET, "/api/v1/search/tv/nothing", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.is_empty());

    let user = store.find_by_email("a@b.com").await.unwrap().unwrap();
    assert!(user.search_history.is_empty());
}

#[tokio::test]
async fn browse_endpoints() {
    let (app, _) = test_app();
    let cookie = signup_alice(&app).await;

    let reply = send(&app, Method::GET, "/api/v1/tv/trending", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["content"]["id"], 3);

    let reply = send(&app, Method::GET, "/api/v1/movie/27205/details", None, Some(&cookie)).await;
    assert_eq!(reply.json()["content"]["media"], "movie");

    let reply = send(&app, Method::GET, "/api/v1/tv/1396/similar", None, Some(&cookie)).await;
    assert_eq!(reply.json()["similar"][0]["id"], 1397);

    let reply = send(&app, Method::GET, "/api/v1/tv/1396/trailers", None, Some(&cookie)).await;
    assert_eq!(reply.json()["trailers"][0]["site"], "YouTube");

    let reply = send(&app, Method::GET, "/api/v1/tv/top_rated", None, Some(&cookie)).await;
    assert_eq!(reply.json()["content"][0]["category"], "top_rated");

    let reply = send(&app, Method::GET, "/api/v1/tv/404/details", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.is_empty());

    let reply = send(&app, Method::GET, "/api/v1/tv/500/trailers", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.json(), json!({ "success": false, "message": "Internal Server Error" }));

    let reply = send(&app, Method::GET, "/api/v1/tv/abc/details", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&app, Method::GET, "/api/v1/tv/+5/details", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

/// Passes every lookup but reports a unique collision on insert, like a
/// concurrent signup that won the race.
struct CollidingStore(UniqueField);

#[async_trait]
impl UserStore for CollidingStore {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn create(&self, _new_user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Duplicate(self.0))
    }

    async fn push_history(&self, user_id: Uuid, _entry: HistoryEntry) -> Result<(), StoreError> {
        Err(StoreError::UnknownUser(user_id))
    }

    async fn pull_history(&self, _user_id: Uuid, _external_id: i64) -> Result<u64, StoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn insert_collision_is_a_conflict_without_session() {
    for (field, message) in [
        (UniqueField::Email, "Email already exists"),
        (UniqueField::Username, "Username already exists"),
    ] {
        let state = AppState::from_parts(
            Arc::new(CollidingStore(field)),
            Arc::new(StubCatalog),
            Arc::new(FixedIndex(0)),
            Arc::new(AppConfig::for_tests()),
        );
        let app = build_app(state);

        let reply = send(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            Some(json!({ "email": "a@b.com", "password": "secret1", "username": "alice" })),
            None,
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.json(), json!({ "success": false, "message": message }));
        assert!(reply.headers.get(header::SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn valid_token_for_missing_user_is_404() {
    let (app, _) = test_app();
    let keys = JwtKeys::from_config(&AppConfig::for_tests().jwt);
    let token = keys.sign(Uuid::new_v4()).unwrap();

    let cookie = format!("jwt-netflix={token}");
    let reply = send(&app, Method::GET, "/api/v1/auth/authCheck", None, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json(), json!({ "success": false, "message": "User not found" }));

    let req = Request::builder()
        .uri("/api/v1/search/history")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn bearer_header_authenticates_like_the_cookie() {
    let (app, store) = test_app();
    signup_alice(&app).await;
    let user = store.find_by_email("a@b.com").await.unwrap().unwrap();
    let token = JwtKeys::from_config(&AppConfig::for_tests().jwt).sign(user.id).unwrap();

    let req = Request::builder()
        .uri("/api/v1/auth/authCheck")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
