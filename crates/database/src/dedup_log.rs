//! Alert dedup log: at most one alert per subscriber per region per day.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::SubscriptionLogEntry;

/// Whether an alert was already logged for this user and region today.
pub async fn sent_today(
    pool: &SqlitePool,
    user_id: &str,
    region_code: &str,
    date: NaiveDate,
) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM subscription_log
        WHERE user_id = ? AND region_code = ? AND sent_on = ?
        "#,
    )
    .bind(user_id)
    .bind(region_code)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

/// Log a sent alert.
///
/// Conditional write against the UNIQUE(user, region, day) index:
/// returns true when this call logged the send, false when an entry
/// for the day was already there. Concurrent writers converge on a
/// single logged send without a separate check.
pub async fn record_sent(
    pool: &SqlitePool,
    user_id: &str,
    region_code: &str,
    network: &str,
    sent_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO subscription_log (user_id, region_code, network, sent_on, sent_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(region_code)
    .bind(network)
    .bind(sent_at.date_naive())
    .bind(sent_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All dedup entries for a user, newest first.
pub async fn entries_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<SubscriptionLogEntry>> {
    let entries = sqlx::query_as::<_, SubscriptionLogEntry>(
        r#"
        SELECT user_id, region_code, network, sent_on, sent_at
        FROM subscription_log
        WHERE user_id = ?
        ORDER BY sent_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
