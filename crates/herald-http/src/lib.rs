//! HTTP/SSE transport for Herald.
//!
//! A thin wrapper over `herald-core`: REST routes for login and
//! messaging, bearer-token auth middleware, and the SSE stream each
//! connected client reads its events from.

mod auth;
mod routes;
mod state;
mod stream;

pub use state::SharedState;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Build the application router.
///
/// Every route except `/api/login` requires a valid session token. If
/// `static_dir` is given, its files are served for any non-API path.
pub fn router(state: SharedState, static_dir: Option<String>) -> Router {
    let authed = Router::new()
        .route("/api/logout", post(routes::logout))
        .route("/api/notify", post(routes::notify))
        .route("/api/users", get(routes::users))
        .route("/api/events", get(stream::events))
        .route("/api/acknowledgments", post(routes::create_acknowledgment))
        .route(
            "/api/acknowledgments/respond",
            post(routes::respond_acknowledgment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let mut app = Router::new()
        .route("/api/login", post(routes::login))
        .merge(authed)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

// ============================================================================
// TESTS
// ============================================================================
