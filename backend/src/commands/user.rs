use crate::db::{DbPool, UserSummary};
use crate::error::SagipResult;
use axum::extract::{Json, State};

pub async fn get_all_users(State(pool): State<DbPool>) -> SagipResult<Json<Vec<UserSummary>>> {
    let users = sqlx::query_as::<_, UserSummary>(
        "SELECT id, first_name, last_name, email, address FROM users ORDER BY id ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(users))
}
