use crate::commands;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;
use axum::{middleware::from_fn_with_state, routing::get, Router};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(commands::user::get_all_users))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
}
