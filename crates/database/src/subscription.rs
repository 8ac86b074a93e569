//! Region subscription CRUD operations.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::RegionSubscription;

/// Register a user for region-scoped alerts.
///
/// A user who already holds a subscription keeps it; the new regions
/// are added to their existing set. Re-registering a region the user
/// already has returns `AlreadyExists`.
pub async fn create_subscription(
    pool: &SqlitePool,
    user_id: &str,
    language_code: &str,
    network: &str,
    region_codes: &[String],
) -> Result<()> {
    let exists = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM subscriptions
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .is_some();

    let mut tx = pool.begin().await?;

    if !exists {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, language_code, network, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(language_code)
        .bind(network)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
    }

    for region_code in region_codes {
        sqlx::query(
            r#"
            INSERT INTO subscription_regions (user_id, region_code)
            VALUES (?, ?)
            "#,
        )
        .bind(user_id)
        .bind(region_code)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DatabaseError::AlreadyExists {
                        entity: "Subscription",
                        id: format!("{}/{}", user_id, region_code),
                    };
                }
            }
            DatabaseError::Sqlx(e)
        })?;
    }

    tx.commit().await?;

    tracing::info!(user_id = %user_id, regions = region_codes.len(), "Subscription registered");
    Ok(())
}

/// Delete a user's subscription and all its region registrations.
pub async fn delete_subscription(pool: &SqlitePool, user_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM subscriptions
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Subscription",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

/// All subscriptions with their region sets.
pub async fn list_subscriptions(pool: &SqlitePool) -> Result<Vec<RegionSubscription>> {
    let rows = sqlx::query_as::<_, (String, String, String, String)>(
        r#"
        SELECT s.user_id, s.language_code, s.network, r.region_code
        FROM subscriptions s
        INNER JOIN subscription_regions r ON r.user_id = s.user_id
        ORDER BY s.user_id, r.region_code
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut subscriptions: Vec<RegionSubscription> = Vec::new();
    for (user_id, language_code, network, region_code) in rows {
        match subscriptions.last_mut() {
            Some(last) if last.user_id == user_id => last.region_codes.push(region_code),
            _ => subscriptions.push(RegionSubscription {
                user_id,
                language_code,
                network,
                region_codes: vec![region_code],
            }),
        }
    }

    Ok(subscriptions)
}

/// Unique subscriber and unique region counts.
pub async fn count_summary(pool: &SqlitePool) -> Result<(i64, i64)> {
    let counts = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(DISTINCT user_id), COUNT(DISTINCT region_code)
        FROM subscription_regions
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}
