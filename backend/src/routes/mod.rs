use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod detection;
pub mod pest;
pub mod user;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(auth::router())
        .merge(pest::router(&state))
        .merge(user::router(&state))
        .merge(detection::router(&state))
        .nest_service(
            crate::upload::PUBLIC_PREFIX,
            ServeDir::new(state.uploads.root()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn root() -> &'static str {
    "Hello, SAGIP backend is running!"
}
