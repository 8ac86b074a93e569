//! Application state shared across handlers.

use std::sync::Arc;

use alerting::{AlertPipeline, Lifecycle, Notifier};
use database::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Card lifecycle manager.
    pub lifecycle: Lifecycle,
    /// Per-submission alert pipeline.
    pub pipeline: AlertPipeline,
    /// Notification channel, for direct acks outside the pipeline.
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, pipeline: AlertPipeline) -> Self {
        let notifier = pipeline.notifier().clone();
        Self {
            lifecycle: Lifecycle::new(db.clone()),
            db,
            pipeline,
            notifier,
        }
    }
}
