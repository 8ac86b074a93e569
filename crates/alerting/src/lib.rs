//! Report-card lifecycle and the region alert pipeline.
//!
//! This crate owns the decision path that runs when a citizen report
//! lands: whether enough corroborating reports exist in a region and
//! disaster category to alert that region's subscribers, and the
//! concurrent fan-out to the notification channel.
//!
//! # Architecture
//!
//! ```text
//! PUT /cards/{id} (cards-web)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Lifecycle: validate card state, write report + received    │
//! │  flip + audit row in one transaction                        │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓ spawned, fire-and-forget
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ALERT PIPELINE                         │
//! │                                                             │
//! │  1. Ack the submitter (skipped for web submissions)         │
//! │  2. Windowed report snapshot → aggregate per (region,       │
//! │     category); severity of the latest report can substitute │
//! │     for volume                                              │
//! │  3. Match subscriber region sets against eligible regions,  │
//! │     filtered to the triggering report's region              │
//! │  4. Dedup gate: at most one alert per subscriber/region/day │
//! │  5. Concurrent dispatch; failures logged, never propagated  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aggregation, severity scoring, and matching are pure functions over
//! an immutable snapshot; the store and the [`Notifier`] seam are the
//! only side-effecting boundaries.

mod aggregate;
mod dispatch;
mod error;
mod lifecycle;
mod matcher;
mod notify;
mod pipeline;
mod severity;
mod windows;

pub use aggregate::{aggregate_reports, RegionCount};
pub use dispatch::{DispatchOutcome, DispatchStatus, Dispatcher};
pub use error::{AlertingError, Result};
pub use lifecycle::{Lifecycle, Location, ReportSubmission, SubmissionOutcome};
pub use matcher::{find_eligible_subscribers, AlertMatch};
pub use notify::{
    AlertPayload, LoggingNotifier, NoOpNotifier, Notifier, NOTIFY_LOCATION_BASED,
    NOTIFY_THANK_YOU, NOTIFY_THANK_YOU_SUBSCRIBER, WEB_NETWORK,
};
pub use pipeline::{AlertPipeline, DEFAULT_ALERT_THRESHOLD};
pub use severity::{classify, Severity};
pub use windows::ReportWindows;

// Re-export commonly used types from the persistence gateway.
pub use database::{Card, CardRecord, DisasterType, RegionSubscription, Report};
