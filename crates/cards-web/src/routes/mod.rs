//! Route handlers for the cards web interface.

pub mod cards;
pub mod health;
pub mod subscriptions;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Cards (GET also serves HEAD existence checks)
        .route("/cards", post(cards::create_card))
        .route(
            "/cards/:card_id",
            get(cards::get_card)
                .put(cards::submit_report)
                .patch(cards::attach_image),
        )
        .route("/cards/:card_id/audit", get(cards::audit_log))
        // Subscriptions
        .route("/subscriptions", post(subscriptions::subscribe))
        .route("/subscriptions/count", get(subscriptions::count))
        .route("/subscriptions/:user_id", delete(subscriptions::unsubscribe))
}
