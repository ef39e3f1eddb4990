//! Process store backed by a direct PostgreSQL connection
//!
//! Used when the service runs next to the database instead of going through
//! the hosted REST layer. The table layout is the same.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::database::validate_table_name;
use crate::error::{StoreError, StoreResult};
use crate::models::{ProcessRow, ProcessStatus, ProcessUpdate};
use crate::store::ProcessStore;

/// PostgreSQL-backed process store
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    fetch_sql: String,
    update_sql: String,
}

impl PostgresStore {
    /// Connect a pool and prepare the statements for `table`
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        table: &str,
        timeout: Duration,
    ) -> StoreResult<Self> {
        info!("Initializing database connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await?;

        info!("Database connection pool initialized successfully");
        Self::with_pool(pool, table)
    }

    /// Build a store on top of an existing pool
    pub fn with_pool(pool: PgPool, table: &str) -> StoreResult<Self> {
        validate_table_name(table)?;

        Ok(Self {
            pool,
            fetch_sql: fetch_statement(table),
            update_sql: update_statement(table),
        })
    }
}

fn fetch_statement(table: &str) -> String {
    format!(
        r#"
        SELECT status::text AS status, channel_id::text AS channel_id, channel_data::text AS channel_data
        FROM {}
        WHERE process_id::text = $1
        LIMIT 2
        "#,
        table
    )
}

fn update_statement(table: &str) -> String {
    format!(
        r#"
        UPDATE {}
        SET status = $1, user_choice = COALESCE($2, user_choice)
        WHERE process_id::text = $3
          AND ($4::text IS NULL OR status::text = $4)
        "#,
        table
    )
}

/// Turn the text form of the `channel_data` column into a JSON value
///
/// Text that is not valid JSON is kept as a string so the decoder reports it.
fn channel_data_value(raw: Option<String>) -> Option<serde_json::Value> {
    raw.map(|text| serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
}

#[async_trait]
impl ProcessStore for PostgresStore {
    async fn fetch_process(&self, process_id: &str) -> StoreResult<Vec<ProcessRow>> {
        debug!("Fetching process {}", process_id);

        let rows = sqlx::query(&self.fetch_sql)
            .bind(process_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch process {}: {}", process_id, e);
                StoreError::Query(e)
            })?;

        rows.into_iter()
            .map(|row| -> StoreResult<ProcessRow> {
                let status: String = row.try_get("status")?;
                Ok(ProcessRow {
                    status: ProcessStatus::from(status.as_str()),
                    channel_id: row.try_get::<Option<String>, _>("channel_id")?.unwrap_or_default(),
                    channel_data: channel_data_value(row.try_get("channel_data")?),
                })
            })
            .collect()
    }

    async fn update_process(&self, process_id: &str, update: &ProcessUpdate) -> StoreResult<u64> {
        debug!("Updating process {} to {}", process_id, update.status);

        let result = sqlx::query(&self.update_sql)
            .bind(update.status.as_str())
            .bind(update.user_choice.as_deref())
            .bind(process_id)
            .bind(update.only_if.as_ref().map(ProcessStatus::as_str))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to update process {}: {}", process_id, e);
                StoreError::Query(e)
            })?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(true),
            Err(e) => {
                error!("Database health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
