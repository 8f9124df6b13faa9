use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use dagzflix_api::api::{create_router, AppState};
use dagzflix_api::config::Config;
use dagzflix_api::models::Session;

fn test_config(jellyfin_url: Option<&str>) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        jellyfin_url: jellyfin_url.map(String::from),
        jellyfin_api_key: None,
        jellyseerr_url: None,
        jellyseerr_api_key: None,
    }
}

fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).unwrap()
}

/// State with a configured library upstream and an open session. The upstream
/// URL is never dialed by the paths under test.
async fn authenticated_state() -> AppState {
    let state = AppState::new(&test_config(Some("http://jellyfin.test")));
    *state.session.write().await = Some(Session {
        user_id: "u1".to_string(),
        user_name: "dagz".to_string(),
        token: "token".to_string(),
    });
    state
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(AppState::new(&test_config(None)));

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_protected_endpoints_require_a_session() {
    let server = create_test_server(AppState::new(&test_config(Some("http://jellyfin.test"))));

    for path in [
        "/api/recommendations",
        "/api/search?q=dune",
        "/api/media/status?id=1",
        "/api/media/collection?id=1",
        "/api/media/library",
        "/api/media/resume",
        "/api/preferences",
    ] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = server
        .post("/api/preferences")
        .json(&json!({ "favoriteGenres": ["Action"] }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_setup_check_reflects_configuration() {
    let server = create_test_server(AppState::new(&test_config(None)));

    let response = server.get("/api/setup/check").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["setupComplete"], false);
    assert_eq!(body["jellyfinConfigured"], false);
    assert_eq!(body["jellyseerrConfigured"], false);
}

#[tokio::test]
async fn test_setup_save_flow() {
    let server = create_test_server(AppState::new(&test_config(None)));

    // Missing jellyfinUrl is a client error
    let response = server
        .post("/api/setup/save")
        .json(&json!({ "jellyseerrUrl": "http://jellyseerr.test" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/setup/save")
        .json(&json!({
            "jellyfinUrl": "http://jellyfin.test/",
            "jellyfinApiKey": "abc",
            "jellyseerrUrl": "http://jellyseerr.test",
        }))
        .await;
    response.assert_status_ok();

    // The save invalidates the cached setup/check entry
    let response = server.get("/api/setup/check").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["setupComplete"], true);
    assert_eq!(body["jellyfinConfigured"], true);
    assert_eq!(body["jellyseerrConfigured"], true);
}

#[tokio::test]
async fn test_login_validates_credentials_before_any_upstream_call() {
    let server = create_test_server(AppState::new(&test_config(Some("http://jellyfin.test"))));

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "username": "", "password": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_session_reports_current_session() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server.get("/api/auth/session").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["name"], "dagz");
}

#[tokio::test]
async fn test_logout_clears_the_session() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server.post("/api/auth/logout").await;
    response.assert_status_ok();

    let response = server.get("/api/preferences").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    // The logout also invalidated the cached auth/session entry
    let response = server.get("/api/auth/session").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_preferences_round_trip_is_a_full_replace() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server
        .post("/api/preferences")
        .json(&json!({
            "favoriteGenres": ["Action", "Drama"],
            "dislikedGenres": ["Horror"],
        }))
        .await;
    response.assert_status_ok();

    let response = server.get("/api/preferences").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["preferences"]["favoriteGenres"], json!(["Action", "Drama"]));
    assert_eq!(body["preferences"]["dislikedGenres"], json!(["Horror"]));
    assert_eq!(body["preferences"]["onboardingComplete"], true);

    // Second save replaces, never merges
    let response = server
        .post("/api/preferences")
        .json(&json!({ "favoriteGenres": ["Comedy"] }))
        .await;
    response.assert_status_ok();

    let response = server.get("/api/preferences").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["preferences"]["favoriteGenres"], json!(["Comedy"]));
    assert_eq!(body["preferences"]["dislikedGenres"], json!([]));
}

#[tokio::test]
async fn test_status_with_no_ids_is_unknown() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    // No item id and no tmdb id: neither signal is obtainable
    let response = server.get("/api/media/status").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "unknown");
    assert_eq!(body["jellyfinAvailable"], false);
    assert_eq!(body["jellyseerrStatus"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_search_with_empty_query_returns_empty_results() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server.get("/api/search?q=").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["totalResults"], 0);
}

#[tokio::test]
async fn test_missing_required_input_is_rejected_before_upstream_calls() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server.get("/api/media/detail").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/api/media/seasons").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/api/media/episodes").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/api/media/collection").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/api/media/trailer").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.post("/api/media/request").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/setup/test")
        .json(&json!({ "type": "", "url": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_without_fulfillment_upstream_is_a_client_error() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server
        .post("/api/media/request")
        .json(&json!({ "tmdbId": 27205 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Jellyseerr"));
}

#[tokio::test]
async fn test_trailer_without_fulfillment_upstream_degrades_to_empty() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server.get("/api/media/trailer?tmdbId=27205").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["trailers"], json!([]));
}

#[tokio::test]
async fn test_discover_without_fulfillment_upstream_degrades_to_empty() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server.get("/api/discover?type=movies").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_wizard_without_fulfillment_upstream_degrades_to_empty() {
    let state = authenticated_state().await;
    let server = create_test_server(state);

    let response = server
        .get("/api/wizard/discover?era=90s&mood=action&runtime=short")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["totalFound"], 0);
}
