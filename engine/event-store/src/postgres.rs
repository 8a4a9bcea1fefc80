//! Postgres-backed event store

use crate::config::StoreConfig;
use crate::error::Result;
use crate::store::EventStore;
use action_events::ActionEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;

/// Row shape of the wf_action_events table.
#[derive(Debug, FromRow)]
struct EventRow {
    action_id: Option<String>,
    event_type: Option<String>,
    message: Option<String>,
    event_ts: Option<DateTime<Utc>>,
}

impl From<EventRow> for ActionEvent {
    fn from(row: EventRow) -> Self {
        Self {
            action_id: row.action_id,
            event_type: row.event_type,
            message: row.message,
            timestamp: row.event_ts,
        }
    }
}

pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Connect, apply migrations, and return a ready store.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(max_connections = config.max_connections, "connected to the event database");
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are the caller's concern.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn insert_events(&self, events: &[ActionEvent]) -> Result<()> {
        // One transaction so the batch lands as a single unit.
        let mut tx = self.pool.begin().await?;
        for event in events {
            sqlx::query(
                "INSERT INTO wf_action_events (action_id, event_type, message, event_ts) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&event.action_id)
            .bind(&event.event_type)
            .bind(&event.message)
            .bind(event.timestamp)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_events_for_action(&self, action_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM wf_action_events WHERE action_id = $1")
            .bind(action_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn events_for_action(&self, action_id: &str) -> Result<Vec<ActionEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT action_id, event_type, message, event_ts FROM wf_action_events \
             WHERE action_id = $1 ORDER BY event_ts DESC NULLS LAST, id",
        )
        .bind(action_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ActionEvent::from).collect())
    }

    async fn count_events_for_action(&self, action_id: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM wf_action_events WHERE action_id = $1")
                .bind(action_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    async fn all_events(&self) -> Result<Vec<ActionEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT action_id, event_type, message, event_ts FROM wf_action_events \
             ORDER BY event_ts DESC NULLS LAST, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ActionEvent::from).collect())
    }
}
