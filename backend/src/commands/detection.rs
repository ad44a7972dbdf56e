use crate::db::{DbPool, DetectionLog};
use crate::error::SagipResult;
use axum::extract::{Json, State};

/// Detection feed for the admin dashboard and gallery, newest first.
pub async fn get_detection_logs(
    State(pool): State<DbPool>,
) -> SagipResult<Json<Vec<DetectionLog>>> {
    let logs = sqlx::query_as::<_, DetectionLog>(
        r#"
        SELECT dl.id, dl.pest_name, dl.image_path, dl.date_detected, u.email, u.id AS user_id
        FROM detection_logs dl
        JOIN users u ON dl.user_id = u.id
        ORDER BY dl.date_detected DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(logs))
}
