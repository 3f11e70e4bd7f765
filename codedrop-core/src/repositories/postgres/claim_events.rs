use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use codedrop_common::error::Error;
use codedrop_common::models::{ClaimEvent, EventStatus};
pub use codedrop_common::traits::repository_traits::ClaimEventRepository;

#[derive(Clone)]
pub struct PostgresClaimEventRepository {
    pool: Pool<Postgres>,
}

impl PostgresClaimEventRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_event(row: &PgRow) -> Result<ClaimEvent, Error> {
    let status: String = row.try_get("status")?;
    Ok(ClaimEvent {
        event_id: row.try_get("event_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        duration_ms: row.try_get("duration_ms")?,
        expires_at: row.try_get("expires_at")?,
        status: status.parse().map_err(Error::Parse)?,
        channel: row.try_get("channel")?,
        created_by: row.try_get("created_by")?,
        code_source_ref: row.try_get("code_source_ref")?,
    })
}

#[async_trait]
impl ClaimEventRepository for PostgresClaimEventRepository {
    async fn create_event(&self, event: &ClaimEvent) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO claim_events (
                event_id, title, description, status,
                created_at, duration_ms, expires_at,
                channel, created_by, code_source_ref
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
            .bind(event.event_id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.status.as_str())
            .bind(event.created_at)
            .bind(event.duration_ms)
            .bind(event.expires_at)
            .bind(&event.channel)
            .bind(event.created_by)
            .bind(&event.code_source_ref)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Option<ClaimEvent>, Error> {
        let row = sqlx::query(
            r#"
            SELECT event_id, title, description, status,
                   created_at, duration_ms, expires_at,
                   channel, created_by, code_source_ref
            FROM claim_events
            WHERE event_id = $1
            "#,
        )
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row {
            Ok(Some(row_to_event(&r)?))
        } else {
            Ok(None)
        }
    }

    async fn set_event_status(&self, event_id: Uuid, status: EventStatus) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE claim_events
            SET status = $1
            WHERE event_id = $2
            "#,
        )
            .bind(status.as_str())
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_active_events(&self) -> Result<Vec<ClaimEvent>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, title, description, status,
                   created_at, duration_ms, expires_at,
                   channel, created_by, code_source_ref
            FROM claim_events
            WHERE status = 'active'
            ORDER BY created_at
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row_to_event(&row)?);
        }
        Ok(result)
    }
}
