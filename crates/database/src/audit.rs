//! Card lifecycle audit trail.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::Result;
use crate::models::AuditLogEntry;

/// Event written when a card is created.
pub const CARD_CREATED: &str = "CARD CREATED";
/// Event written when a report is attached to a card.
pub const REPORT_SUBMITTED: &str = "REPORT SUBMITTED";
/// Event written when a report is patched with an image URL.
pub const REPORT_PATCHED: &str = "REPORT UPDATE (PATCH)";

/// Append an audit event inside an open transaction.
///
/// Takes the transaction rather than the pool so the event commits or
/// rolls back with the lifecycle write it describes.
pub async fn append(
    tx: &mut Transaction<'_, Sqlite>,
    card_id: &str,
    event_type: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO card_audit_log (card_id, event_type, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(card_id)
    .bind(event_type)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Get all audit events for a card, oldest first.
pub async fn log_for_card(pool: &SqlitePool, card_id: &str) -> Result<Vec<AuditLogEntry>> {
    let entries = sqlx::query_as::<_, AuditLogEntry>(
        r#"
        SELECT id, card_id, event_type, created_at
        FROM card_audit_log
        WHERE card_id = ?
        ORDER BY id
        "#,
    )
    .bind(card_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
