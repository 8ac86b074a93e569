//! Card lifecycle: creation, report receipt, image patch.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use database::{card, report, Card, CardRecord, Database, DisasterType, NewReport, Report};

use crate::error::{AlertingError, Result};

/// A submitted report payload, as received from the HTTP surface.
///
/// `region_code` and `city` are resolved upstream from the submission
/// location before the payload reaches this service.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSubmission {
    pub disaster_type: DisasterType,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_training: bool,
    pub region_code: String,
    pub city: Option<String>,
    #[serde(default = "empty_object")]
    pub report_data: serde_json::Value,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub location: Location,
    pub partner_code: Option<String>,
    /// Earthquake follow-up flag: a second submission for a received
    /// earthquake card spawns a sibling card instead of being rejected.
    #[serde(default)]
    pub sub_submission: bool,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

/// Submission coordinates.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Where a submission landed.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// The card the report was attached to (the sibling, for
    /// earthquake follow-ups).
    pub card: Card,
    pub report: Report,
    /// Set when a sibling card was spawned; holds the original card id.
    pub sibling_of: Option<String>,
}

/// Owns the finite-state progression of a card from creation through
/// report receipt to optional image attachment.
#[derive(Clone)]
pub struct Lifecycle {
    db: Database,
}

impl Lifecycle {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open a new card for a conversation.
    pub async fn create_card(&self, username: &str, network: &str, language: &str) -> Result<Card> {
        Ok(card::create_card(self.db.pool(), username, network, language).await?)
    }

    /// Fetch a card with its report, if received.
    pub async fn get_card(&self, card_id: &str) -> Result<CardRecord> {
        card::get_card(self.db.pool(), card_id)
            .await
            .map_err(|e| card_not_found(card_id, e))
    }

    /// Whether a card exists.
    pub async fn card_exists(&self, card_id: &str) -> Result<bool> {
        Ok(card::card_exists(self.db.pool(), card_id).await?)
    }

    /// Attach a report to a card, flipping it to received.
    ///
    /// A received card rejects a second submission, except an
    /// earthquake follow-up carrying `sub_submission`: that spawns a
    /// sibling card (same username/network/language) and attaches the
    /// follow-up report there instead.
    pub async fn submit_report(
        &self,
        card_id: &str,
        submission: &ReportSubmission,
    ) -> Result<SubmissionOutcome> {
        let pool = self.db.pool();
        let record = card::get_card(pool, card_id)
            .await
            .map_err(|e| card_not_found(card_id, e))?;

        if record.card.received {
            if !(submission.sub_submission && submission.disaster_type == DisasterType::Earthquake) {
                return Err(AlertingError::AlreadyReceived(card_id.to_string()));
            }

            let sibling = card::create_card(
                pool,
                &record.card.username,
                &record.card.network,
                &record.card.language,
            )
            .await?;
            tracing::info!(
                card_id = %card_id,
                sibling_id = %sibling.card_id,
                "Earthquake follow-up: sibling card spawned"
            );

            let report = report::submit_report(pool, &sibling.card_id, &to_new_report(submission))
                .await?;
            return Ok(SubmissionOutcome {
                card: received(sibling),
                report,
                sibling_of: Some(card_id.to_string()),
            });
        }

        let report = report::submit_report(pool, card_id, &to_new_report(submission)).await?;
        Ok(SubmissionOutcome {
            card: received(record.card),
            report,
            sibling_of: None,
        })
    }

    /// Patch a received card's report with an image URL.
    pub async fn attach_image(&self, card_id: &str, image_url: &str) -> Result<()> {
        let pool = self.db.pool();
        let record = card::get_card(pool, card_id)
            .await
            .map_err(|e| card_not_found(card_id, e))?;

        if !record.card.received {
            return Err(AlertingError::NotReceived(card_id.to_string()));
        }
        if record.report.as_ref().is_some_and(|r| r.image_url.is_some()) {
            return Err(AlertingError::AlreadyAttached(card_id.to_string()));
        }

        report::attach_image(pool, card_id, image_url).await?;
        Ok(())
    }
}

fn to_new_report(submission: &ReportSubmission) -> NewReport {
    NewReport {
        created_at: submission.created_at.unwrap_or_else(Utc::now),
        disaster_type: submission.disaster_type,
        is_training: submission.is_training,
        region_code: submission.region_code.clone(),
        city: submission.city.clone(),
        report_data: submission.report_data.clone(),
        text: submission.text.clone(),
        image_url: submission.image_url.clone(),
        latitude: submission.location.lat,
        longitude: submission.location.lng,
        partner_code: submission.partner_code.clone(),
    }
}

fn received(mut card: Card) -> Card {
    card.received = true;
    card
}

fn card_not_found(card_id: &str, err: database::DatabaseError) -> AlertingError {
    match err {
        database::DatabaseError::NotFound { .. } => AlertingError::CardNotFound(card_id.to_string()),
        other => AlertingError::Storage(other),
    }
}
