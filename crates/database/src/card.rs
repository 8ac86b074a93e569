//! Card CRUD operations.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::audit;
use crate::error::{DatabaseError, Result};
use crate::models::{Card, CardRecord, Report};

/// Create a new card in the unreceived state.
///
/// The card insert and its "CARD CREATED" audit row commit together.
pub async fn create_card(
    pool: &SqlitePool,
    username: &str,
    network: &str,
    language: &str,
) -> Result<Card> {
    let card = Card {
        card_id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        network: network.to_string(),
        language: language.to_string(),
        received: false,
        created_at: Utc::now(),
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO cards (card_id, username, network, language, received, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&card.card_id)
    .bind(&card.username)
    .bind(&card.network)
    .bind(&card.language)
    .bind(card.received)
    .bind(card.created_at)
    .execute(&mut *tx)
    .await?;

    audit::append(&mut tx, &card.card_id, audit::CARD_CREATED).await?;

    tx.commit().await?;

    tracing::info!(card_id = %card.card_id, network = %card.network, "Card created");
    Ok(card)
}

/// Get a card by id, with its report if one has been received.
pub async fn get_card(pool: &SqlitePool, card_id: &str) -> Result<CardRecord> {
    let card = sqlx::query_as::<_, Card>(
        r#"
        SELECT card_id, username, network, language, received, created_at
        FROM cards
        WHERE card_id = ?
        "#,
    )
    .bind(card_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Card",
        id: card_id.to_string(),
    })?;

    let report = sqlx::query_as::<_, Report>(
        r#"
        SELECT id, card_id, created_at, disaster_type, is_training, region_code,
               city, report_data, text, image_url, latitude, longitude,
               partner_code, status
        FROM reports
        WHERE card_id = ?
        "#,
    )
    .bind(card_id)
    .fetch_optional(pool)
    .await?;

    Ok(CardRecord { card, report })
}

/// Check whether a card exists.
pub async fn card_exists(pool: &SqlitePool, card_id: &str) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM cards
        WHERE card_id = ?
        "#,
    )
    .bind(card_id)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

/// Count total cards.
pub async fn count_cards(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM cards
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
