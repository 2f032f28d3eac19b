/// Monthly usage counters for metered users
///
/// One counter per user per calendar month. The counter is keyed by a
/// `YYYY-MM` period key and resets implicitly when the key changes; no
/// background job clears old counts.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
    /// Calendar month key, e.g. "2026-08"
    pub period_key: String,
    pub count: u32,
}

impl UsageCounter {
    pub fn period_key_for(now: DateTime<Utc>) -> String {
        now.format("%Y-%m").to_string()
    }

    /// Fresh zero counter for the month containing `now`
    pub fn new_for(now: DateTime<Utc>) -> Self {
        Self {
            period_key: Self::period_key_for(now),
            count: 0,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait QuotaStore: Send + Sync {
    async fn load(&self, user_id: &str) -> AppResult<Option<UsageCounter>>;
    async fn save(&self, user_id: &str, counter: &UsageCounter) -> AppResult<()>;
}

/// SQLite-backed counter store; the local store is authoritative for gating,
/// the backend mirror is best-effort only.
pub struct SqliteQuotaStore {
    pool: SqlitePool,
}

impl SqliteQuotaStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the counter table if it does not exist yet
    pub async fn init(pool: &SqlitePool) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS usage_counters (
                user_id    TEXT PRIMARY KEY,
                period_key TEXT NOT NULL,
                count      INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl QuotaStore for SqliteQuotaStore {
    async fn load(&self, user_id: &str) -> AppResult<Option<UsageCounter>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT period_key, count FROM usage_counters WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(period_key, count)| UsageCounter {
            period_key,
            count: count as u32,
        }))
    }

    async fn save(&self, user_id: &str, counter: &UsageCounter) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO usage_counters (user_id, period_key, count) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                period_key = excluded.period_key,
                count = excluded.count",
        )
        .bind(user_id)
        .bind(&counter.period_key)
        .bind(counter.count as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
