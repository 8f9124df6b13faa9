use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, AppState};
use crate::middleware::request_id;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes())
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Setup
        .route("/setup/check", get(handlers::setup_check))
        .route("/setup/test", post(handlers::setup_test))
        .route("/setup/save", post(handlers::setup_save))
        // Auth proxy
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/session", get(handlers::auth_session))
        // Preferences
        .route(
            "/preferences",
            get(handlers::preferences_get).post(handlers::preferences_save),
        )
        // Library
        .route("/media/library", get(handlers::media_library))
        .route("/media/genres", get(handlers::media_genres))
        .route("/media/detail", get(handlers::media_detail))
        .route("/media/resume", get(handlers::media_resume))
        .route("/media/seasons", get(handlers::media_seasons))
        .route("/media/episodes", get(handlers::media_episodes))
        // Smart button
        .route("/media/status", get(handlers::media_status))
        .route("/media/request", post(handlers::media_request))
        // Trailer & collection
        .route("/media/trailer", get(handlers::media_trailer))
        .route("/media/collection", get(handlers::media_collection))
        // Search & discover
        .route("/search", get(handlers::search))
        .route("/discover", get(handlers::discover))
        .route("/wizard/discover", get(handlers::wizard_discover))
        // Recommendations (DagzRank)
        .route("/recommendations", get(handlers::recommendations))
}
