use crate::commands;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

/// Ceiling for a whole multipart form, images included.
const MAX_FORM_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: &AppState) -> Router<AppState> {
    let guard = from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .route(
            "/pests",
            get(commands::pest::list_pests)
                .merge(post(commands::pest::create_pest).route_layer(guard.clone())),
        )
        .route("/pests/hosts", get(commands::pest::list_hosts))
        .route(
            "/pests/:id",
            put(commands::pest::update_pest)
                .delete(commands::pest::delete_pest)
                .route_layer(guard),
        )
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
}
