//! Card routes: creation, lookup, report submission, image patch.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use alerting::ReportSubmission;
use database::{audit, AuditLogEntry, CardRecord};

use crate::error::Result;
use crate::state::AppState;

/// Request to create a card.
#[derive(Deserialize)]
pub struct CreateCardRequest {
    pub username: String,
    pub network: String,
    pub language: String,
}

/// Response for a created card.
#[derive(Serialize)]
pub struct CreateCardResponse {
    pub card_id: String,
    pub created: bool,
}

/// Response wrapping a fetched card.
#[derive(Serialize)]
pub struct CardResponse {
    pub result: CardRecord,
}

/// Response for a submitted report.
#[derive(Serialize)]
pub struct SubmitResponse {
    /// Card the report landed on (a sibling card for earthquake
    /// follow-ups).
    pub card_id: String,
    pub created: bool,
}

/// Request to patch a report with its image URL.
#[derive(Deserialize)]
pub struct AttachImageRequest {
    pub image_url: String,
}

/// Response for a patched report.
#[derive(Serialize)]
pub struct PatchResponse {
    pub card_id: String,
    pub updated: bool,
}

/// Response wrapping a card's audit trail.
#[derive(Serialize)]
pub struct AuditResponse {
    pub result: Vec<AuditLogEntry>,
}

/// Create a card.
pub async fn create_card(
    State(state): State<AppState>,
    Json(req): Json<CreateCardRequest>,
) -> Result<Json<CreateCardResponse>> {
    let card = state
        .lifecycle
        .create_card(&req.username, &req.network, &req.language)
        .await?;

    Ok(Json(CreateCardResponse {
        card_id: card.card_id,
        created: true,
    }))
}

/// Fetch a card with its report, if received. Also serves HEAD
/// existence checks.
pub async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<CardResponse>> {
    let record = state.lifecycle.get_card(&card_id).await?;
    Ok(Json(CardResponse { result: record }))
}

/// Submit a report for a card.
///
/// On success the alert pass is spawned fire-and-forget: the response
/// never waits on acks or subscriber fan-out, and a notification
/// outage can't fail a submission that already committed.
pub async fn submit_report(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(submission): Json<ReportSubmission>,
) -> Result<Json<SubmitResponse>> {
    let outcome = state.lifecycle.submit_report(&card_id, &submission).await?;

    info!(
        card_id = %outcome.card.card_id,
        region_code = %outcome.report.region_code,
        sibling = outcome.sibling_of.is_some(),
        "Report accepted"
    );

    let response = SubmitResponse {
        card_id: outcome.card.card_id.clone(),
        created: true,
    };

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        pipeline.after_submission(outcome).await;
    });

    Ok(Json(response))
}

/// Patch a received card's report with an image URL.
pub async fn attach_image(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(req): Json<AttachImageRequest>,
) -> Result<Json<PatchResponse>> {
    state.lifecycle.attach_image(&card_id, &req.image_url).await?;

    Ok(Json(PatchResponse {
        card_id,
        updated: true,
    }))
}

/// Fetch a card's lifecycle audit trail.
pub async fn audit_log(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<AuditResponse>> {
    // Distinguish an unknown card from one with no events.
    state.lifecycle.get_card(&card_id).await?;

    let entries = audit::log_for_card(state.db.pool(), &card_id).await?;
    Ok(Json(AuditResponse { result: entries }))
}
