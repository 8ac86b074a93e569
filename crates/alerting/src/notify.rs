//! Notification channel trait and payloads.

use async_trait::async_trait;
use serde::Serialize;

use crate::aggregate::RegionCount;
use crate::error::AlertingError;

/// Sentinel network for web submissions; they get no ack message.
pub const WEB_NETWORK: &str = "website";

/// Ack sent to a submitter after their report lands.
pub const NOTIFY_THANK_YOU: &str = "thank-you";
/// Ack sent to a user after registering a subscription.
pub const NOTIFY_THANK_YOU_SUBSCRIBER: &str = "thank-you-subscriber";
/// Region alert sent to subscribers when a region crosses the threshold.
pub const NOTIFY_LOCATION_BASED: &str = "location-based";

/// Payload handed to the external notification channel.
///
/// The channel acknowledges acceptance of the invocation only, not
/// delivery; at-least-once semantics are bounded by the dedup log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertPayload {
    pub user_id: String,
    pub notify_type: String,
    pub language: String,
    /// Delivery channel the invocation should go out on.
    pub network: String,
    /// Region the alert is about; absent for acks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    /// Current aggregated counts, included with region alerts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub report_counts: Vec<RegionCount>,
    /// Report that triggered this invocation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<i64>,
}

impl AlertPayload {
    /// Ack for a submitted report.
    pub fn thank_you(user_id: &str, language: &str, network: &str, report_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            notify_type: NOTIFY_THANK_YOU.to_string(),
            language: language.to_string(),
            network: network.to_string(),
            region_code: None,
            report_counts: Vec::new(),
            report_id: Some(report_id),
        }
    }

    /// Ack for a new subscription.
    pub fn thank_you_subscriber(user_id: &str, language: &str, network: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            notify_type: NOTIFY_THANK_YOU_SUBSCRIBER.to_string(),
            language: language.to_string(),
            network: network.to_string(),
            region_code: None,
            report_counts: Vec::new(),
            report_id: None,
        }
    }
}

/// Trait for invoking the external notification channel.
///
/// Abstracted to support different transports (messaging gateways,
/// tests, etc.). Implementations must be fire-and-forget cheap: the
/// pipeline treats a returned `Ok` as "invocation accepted".
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Invoke the notification channel with a payload.
    async fn notify(&self, payload: &AlertPayload) -> Result<(), AlertingError>;
}

/// A no-op notifier for testing that discards all invocations.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _payload: &AlertPayload) -> Result<(), AlertingError> {
        Ok(())
    }
}

/// A logging notifier for debugging that logs every invocation.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), AlertingError> {
        tracing::info!(
            user_id = %payload.user_id,
            notify_type = %payload.notify_type,
            network = %payload.network,
            region_code = payload.region_code.as_deref().unwrap_or("-"),
            "Notification invoked"
        );
        Ok(())
    }
}
