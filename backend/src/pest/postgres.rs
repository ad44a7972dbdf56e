use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::{
    group_control_methods, ControlMethodRow, ControlMethods, NewPest, Pest, PestRecord,
    PestStore, PestUpdate,
};
use crate::db::DbPool;
use crate::error::{SagipError, SagipResult};

const PEST_COLUMNS: &str = "id_pest, pest_name, tagalog_name, pest_img, identifying_marks, where_to_find, damage, life_cycle, life_cycle_img, host";

/// [`PestStore`] backed by the `pest` and `controlmethod` tables.
#[derive(Clone)]
pub struct PgPestStore {
    pool: DbPool,
}

impl PgPestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// One multi-row insert for the whole set; no statement when empty.
async fn insert_control_methods(
    conn: &mut PgConnection,
    id_pest: i32,
    methods: &ControlMethods,
) -> SagipResult<()> {
    if methods.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO controlmethod (id_pest, category, description) ");
    builder.push_values(methods.entries(), |mut row, (category, description)| {
        row.push_bind(id_pest)
            .push_bind(category.as_str())
            .push_bind(description.to_owned());
    });
    builder.build().execute(conn).await?;
    Ok(())
}

#[async_trait]
impl PestStore for PgPestStore {
    async fn list_pests(&self) -> SagipResult<Vec<Pest>> {
        let records = sqlx::query_as::<_, PestRecord>(&format!(
            "SELECT {PEST_COLUMNS} FROM pest ORDER BY id_pest"
        ))
        .fetch_all(&self.pool)
        .await?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = records.iter().map(|r| r.id_pest).collect();
        let rows = sqlx::query_as::<_, ControlMethodRow>(
            "SELECT id_pest, category, description FROM controlmethod WHERE id_pest = ANY($1) ORDER BY id_control_method",
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            "Fetched {} pests with {} control methods",
            records.len(),
            rows.len()
        );
        Ok(group_control_methods(records, rows))
    }

    async fn distinct_hosts(&self) -> SagipResult<Vec<String>> {
        let hosts: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT host FROM pest WHERE host IS NOT NULL AND host <> '' ORDER BY host",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(hosts.into_iter().map(|(host,)| host).collect())
    }

    async fn create_pest(&self, pest: NewPest) -> SagipResult<i32> {
        let mut tx = self.pool.begin().await?;

        let row: (i32,) = sqlx::query_as(
            "INSERT INTO pest (pest_name, tagalog_name, pest_img, identifying_marks, where_to_find, damage, life_cycle, life_cycle_img, host)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id_pest",
        )
        .bind(&pest.pest_name)
        .bind(&pest.tagalog_name)
        .bind(&pest.pest_img)
        .bind(&pest.identifying_marks)
        .bind(&pest.where_to_find)
        .bind(&pest.damage)
        .bind(&pest.life_cycle)
        .bind(&pest.life_cycle_img)
        .bind(&pest.host)
        .fetch_one(&mut *tx)
        .await?;

        insert_control_methods(&mut tx, row.0, &pest.control_methods).await?;

        tx.commit().await?;
        Ok(row.0)
    }

    async fn update_pest(&self, id: i32, update: PestUpdate) -> SagipResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent saves of the same pest run one after the other.
        let exists: Option<(i32,)> =
            sqlx::query_as("SELECT id_pest FROM pest WHERE id_pest = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(SagipError::NotFound("Pest not found".to_string()));
        }

        let assignments = update.assignments();
        if !assignments.is_empty() {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE pest SET ");
            {
                let mut set = builder.separated(", ");
                for (column, value) in assignments {
                    set.push(format!("{column} = "));
                    set.push_bind_unseparated(value);
                }
            }
            builder.push(" WHERE id_pest = ").push_bind(id);
            builder.build().execute(&mut *tx).await?;
        }

        sqlx::query("DELETE FROM controlmethod WHERE id_pest = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_control_methods(&mut tx, id, &update.control_methods).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_pest(&self, id: i32) -> SagipResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM controlmethod WHERE id_pest = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM pest WHERE id_pest = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
