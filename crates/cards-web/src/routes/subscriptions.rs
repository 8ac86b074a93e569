//! Region subscription routes.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use alerting::AlertPayload;
use database::subscription;

use crate::error::{ApiError, Result};
use crate::state::AppState;

fn default_network() -> String {
    "whatsapp".to_string()
}

/// Request to register for region alerts.
#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub user_id: String,
    pub language: String,
    #[serde(default = "default_network")]
    pub network: String,
    pub regions: Vec<String>,
}

/// Response for a registered subscription.
#[derive(Serialize)]
pub struct SubscribeResponse {
    pub created: bool,
}

/// Response for a deleted subscription.
#[derive(Serialize)]
pub struct UnsubscribeResponse {
    pub deleted: bool,
}

/// Subscriber and region counts.
#[derive(Serialize)]
pub struct CountResponse {
    pub user_count: i64,
    pub region_count: i64,
}

/// Register a user for region alerts and ack them on their channel.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>> {
    if req.user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }
    if req.regions.is_empty() {
        return Err(ApiError::BadRequest("at least one region is required".to_string()));
    }

    subscription::create_subscription(
        state.db.pool(),
        &req.user_id,
        &req.language,
        &req.network,
        &req.regions,
    )
    .await?;

    info!(user_id = %req.user_id, regions = req.regions.len(), "Subscriber registered");

    // The registration already committed; a failed ack is not an error.
    let ack = AlertPayload::thank_you_subscriber(&req.user_id, &req.language, &req.network);
    if let Err(err) = state.notifier.notify(&ack).await {
        tracing::warn!(user_id = %req.user_id, error = %err, "Subscriber ack failed");
    }

    Ok(Json(SubscribeResponse { created: true }))
}

/// Delete a user's subscription.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UnsubscribeResponse>> {
    subscription::delete_subscription(state.db.pool(), &user_id).await?;
    Ok(Json(UnsubscribeResponse { deleted: true }))
}

/// Unique subscriber and region counts.
pub async fn count(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let (user_count, region_count) = subscription::count_summary(state.db.pool()).await?;
    Ok(Json(CountResponse {
        user_count,
        region_count,
    }))
}
