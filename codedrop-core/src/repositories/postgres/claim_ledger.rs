use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use codedrop_common::error::Error;
use codedrop_common::models::ClaimRecord;
pub use codedrop_common::traits::repository_traits::ClaimLedger;

/// Write-once claim ledger backed by the `event_claims` table.
///
/// The composite primary key (event_id, participant_id) makes the insert the
/// linearization point for duplicate detection: concurrent puts for the same
/// key race on the unique constraint and exactly one wins.
#[derive(Clone)]
pub struct PostgresClaimLedger {
    pool: Pool<Postgres>,
}

impl PostgresClaimLedger {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClaimLedger for PostgresClaimLedger {
    async fn put(&self, record: &ClaimRecord) -> Result<(), Error> {
        let res = sqlx::query(
            r#"
            INSERT INTO event_claims (event_id, participant_id, claimed, claimed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
            .bind(record.event_id)
            .bind(record.participant_id)
            .bind(record.claimed)
            .bind(record.claimed_at)
            .execute(&self.pool)
            .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) => {
                // 23505 => unique_violation on the composite primary key
                if let Some(db_err) = e.as_database_error() {
                    if db_err.code().as_deref() == Some("23505") {
                        return Err(Error::DuplicateClaim {
                            event_id: record.event_id,
                            participant_id: record.participant_id,
                        });
                    }
                }
                Err(Error::Database(e))
            }
        }
    }

    async fn get_all(&self, event_id: Uuid) -> Result<Vec<ClaimRecord>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, participant_id, claimed, claimed_at
            FROM event_claims
            WHERE event_id = $1
            ORDER BY claimed_at
            "#,
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        let mut result = Vec::new();
        for row in rows {
            result.push(ClaimRecord {
                event_id: row.try_get("event_id")?,
                participant_id: row.try_get("participant_id")?,
                claimed: row.try_get("claimed")?,
                claimed_at: row.try_get("claimed_at")?,
            });
        }
        Ok(result)
    }
}
