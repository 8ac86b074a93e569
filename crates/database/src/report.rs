//! Report writes and the windowed report query feeding aggregation.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::audit;
use crate::error::{DatabaseError, Result};
use crate::models::{ActiveReport, DisasterType, Report};

/// Input for a report insert.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub created_at: DateTime<Utc>,
    pub disaster_type: DisasterType,
    pub is_training: bool,
    pub region_code: String,
    pub city: Option<String>,
    pub report_data: serde_json::Value,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub partner_code: Option<String>,
}

/// Per-category cutoffs for the windowed report query.
///
/// A report qualifies when its `created_at` is at or after the cutoff
/// for its own category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowCutoffs {
    pub flood: DateTime<Utc>,
    pub earthquake: DateTime<Utc>,
    pub wind: DateTime<Utc>,
    pub haze: DateTime<Utc>,
    pub volcano: DateTime<Utc>,
    pub fire: DateTime<Utc>,
    pub typhoon: DateTime<Utc>,
}

/// Attach a report to a card.
///
/// The report insert, the card's received flip, and the audit row all
/// commit in one transaction: a crash mid-write leaves the card
/// unreceived and resubmittable, never received without a report.
pub async fn submit_report(pool: &SqlitePool, card_id: &str, new: &NewReport) -> Result<Report> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO reports
            (card_id, created_at, disaster_type, is_training, region_code, city,
             report_data, text, image_url, latitude, longitude, partner_code, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'Confirmed')
        "#,
    )
    .bind(card_id)
    .bind(new.created_at)
    .bind(new.disaster_type)
    .bind(new.is_training)
    .bind(&new.region_code)
    .bind(&new.city)
    .bind(&new.report_data)
    .bind(&new.text)
    .bind(&new.image_url)
    .bind(new.latitude)
    .bind(new.longitude)
    .bind(&new.partner_code)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Report",
                    id: card_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    let result = sqlx::query(
        r#"
        UPDATE cards
        SET received = 1
        WHERE card_id = ?
        "#,
    )
    .bind(card_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        // No card row to flip; roll everything back.
        tx.rollback().await?;
        return Err(DatabaseError::NotFound {
            entity: "Card",
            id: card_id.to_string(),
        });
    }

    audit::append(&mut tx, card_id, audit::REPORT_SUBMITTED).await?;

    tx.commit().await?;

    tracing::info!(
        card_id = %card_id,
        disaster_type = %new.disaster_type,
        region_code = %new.region_code,
        is_training = new.is_training,
        "Report submitted"
    );

    Ok(Report {
        id: inserted.last_insert_rowid(),
        card_id: card_id.to_string(),
        created_at: new.created_at,
        disaster_type: new.disaster_type,
        is_training: new.is_training,
        region_code: new.region_code.clone(),
        city: new.city.clone(),
        report_data: new.report_data.clone(),
        text: new.text.clone(),
        image_url: new.image_url.clone(),
        latitude: new.latitude,
        longitude: new.longitude,
        partner_code: new.partner_code.clone(),
        status: "Confirmed".to_string(),
    })
}

/// Patch a received report with its image URL.
///
/// The update and its audit row commit together.
pub async fn attach_image(pool: &SqlitePool, card_id: &str, image_url: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE reports
        SET image_url = ?
        WHERE card_id = ?
        "#,
    )
    .bind(image_url)
    .bind(card_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(DatabaseError::NotFound {
            entity: "Report",
            id: card_id.to_string(),
        });
    }

    audit::append(&mut tx, card_id, audit::REPORT_PATCHED).await?;

    tx.commit().await?;

    tracing::info!(card_id = %card_id, "Report image attached");
    Ok(())
}

/// All non-training reports inside their category's rolling window.
///
/// One branch per category, each with its own cutoff, matching the
/// per-category windows the aggregation pass is configured with.
pub async fn active_reports(pool: &SqlitePool, cutoffs: &WindowCutoffs) -> Result<Vec<ActiveReport>> {
    let reports = sqlx::query_as::<_, ActiveReport>(
        r#"
        SELECT id, created_at, disaster_type, is_training, region_code, city, report_data
        FROM reports
        WHERE is_training = 0
          AND (
               (disaster_type = 'flood'      AND created_at >= ?)
            OR (disaster_type = 'earthquake' AND created_at >= ?)
            OR (disaster_type = 'wind'       AND created_at >= ?)
            OR (disaster_type = 'haze'       AND created_at >= ?)
            OR (disaster_type = 'volcano'    AND created_at >= ?)
            OR (disaster_type = 'fire'       AND created_at >= ?)
            OR (disaster_type = 'typhoon'    AND created_at >= ?)
          )
        ORDER BY created_at
        "#,
    )
    .bind(cutoffs.flood)
    .bind(cutoffs.earthquake)
    .bind(cutoffs.wind)
    .bind(cutoffs.haze)
    .bind(cutoffs.volcano)
    .bind(cutoffs.fire)
    .bind(cutoffs.typhoon)
    .fetch_all(pool)
    .await?;

    Ok(reports)
}
