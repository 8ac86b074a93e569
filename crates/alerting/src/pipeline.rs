//! The per-submission alert pass: aggregate, match, dedup, dispatch.

use std::sync::Arc;

use chrono::Utc;

use database::{report, subscription, Database};

use crate::aggregate::aggregate_reports;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::Result;
use crate::lifecycle::SubmissionOutcome;
use crate::matcher::find_eligible_subscribers;
use crate::notify::{AlertPayload, Notifier, WEB_NETWORK};
use crate::windows::ReportWindows;

/// Default minimum aggregated report count to alert a region.
pub const DEFAULT_ALERT_THRESHOLD: u32 = 3;

/// Runs the aggregation → matching → dedup → dispatch pass after a
/// report lands, plus the submitter's acknowledgement.
///
/// Cheap to clone; the intended use is `tokio::spawn`ing
/// [`AlertPipeline::after_submission`] from the submission handler so
/// the HTTP response never waits on fan-out.
#[derive(Clone)]
pub struct AlertPipeline {
    db: Database,
    notifier: Arc<dyn Notifier>,
    dispatcher: Dispatcher,
    windows: ReportWindows,
    threshold: u32,
}

impl AlertPipeline {
    pub fn new(
        db: Database,
        notifier: Arc<dyn Notifier>,
        windows: ReportWindows,
        threshold: u32,
    ) -> Self {
        let dispatcher = Dispatcher::new(db.pool().clone(), notifier.clone());
        Self {
            db,
            notifier,
            dispatcher,
            windows,
            threshold,
        }
    }

    /// The notification channel this pipeline dispatches on.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Side effects of an accepted submission: ack the submitter, then
    /// run the alert pass for the report's region.
    ///
    /// Every failure in here is logged and swallowed; "report
    /// submitted" was already decided when the write committed.
    pub async fn after_submission(&self, outcome: SubmissionOutcome) {
        // Web submitters see the HTTP response; no ack message.
        if outcome.card.network != WEB_NETWORK {
            let ack = AlertPayload::thank_you(
                &outcome.card.username,
                &outcome.card.language,
                &outcome.card.network,
                outcome.report.id,
            );
            if let Err(err) = self.notifier.notify(&ack).await {
                tracing::warn!(card_id = %outcome.card.card_id, error = %err, "Submitter ack failed");
            }
        }

        // Training reports never trigger alerting.
        if outcome.report.is_training {
            return;
        }

        if let Err(err) = self.run_pass(&outcome.report.region_code, outcome.report.id).await {
            tracing::warn!(
                report_id = outcome.report.id,
                region_code = %outcome.report.region_code,
                error = %err,
                "Alert pass failed"
            );
        }
    }

    /// One alert pass over the current report snapshot.
    ///
    /// Matches are filtered to the triggering report's region: a pass
    /// never alerts a subscriber for a region unrelated to the
    /// submission that started it. Other regions alert when their own
    /// submissions trigger passes.
    pub async fn run_pass(
        &self,
        triggering_region: &str,
        report_id: i64,
    ) -> Result<Vec<DispatchOutcome>> {
        let pool = self.db.pool();

        let cutoffs = self.windows.cutoffs(Utc::now());
        let snapshot = report::active_reports(pool, &cutoffs).await?;
        let counts = aggregate_reports(&snapshot);

        let subscriptions = subscription::list_subscriptions(pool).await?;
        let matches: Vec<_> = find_eligible_subscribers(&counts, &subscriptions, self.threshold)
            .into_iter()
            .filter(|m| m.region_code == triggering_region)
            .collect();

        if matches.is_empty() {
            tracing::debug!(
                region_code = %triggering_region,
                groups = counts.len(),
                "No eligible subscribers for this pass"
            );
            return Ok(Vec::new());
        }

        tracing::info!(
            region_code = %triggering_region,
            matches = matches.len(),
            "Dispatching region alerts"
        );
        Ok(self.dispatcher.dispatch(&matches, &counts, report_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchStatus;
    use crate::error::AlertingError;
    use crate::lifecycle::{Lifecycle, Location, ReportSubmission};
    use async_trait::async_trait;
    use database::DisasterType;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<AlertPayload>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, payload: &AlertPayload) -> std::result::Result<(), AlertingError> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    struct Harness {
        lifecycle: Lifecycle,
        pipeline: AlertPipeline,
        notifier: Arc<RecordingNotifier>,
        db: Database,
    }

    async fn harness() -> Harness {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = AlertPipeline::new(
            db.clone(),
            notifier.clone(),
            ReportWindows::default(),
            DEFAULT_ALERT_THRESHOLD,
        );
        Harness {
            lifecycle: Lifecycle::new(db.clone()),
            pipeline,
            notifier,
            db,
        }
    }

    fn submission(region: &str, disaster_type: DisasterType, data: serde_json::Value) -> ReportSubmission {
        ReportSubmission {
            disaster_type,
            created_at: None,
            is_training: false,
            region_code: region.to_string(),
            city: Some("Jakarta".to_string()),
            report_data: data,
            text: None,
            image_url: None,
            location: Location { lat: -6.2, lng: 106.8 },
            partner_code: None,
            sub_submission: false,
        }
    }

    async fn submit(h: &Harness, sub: ReportSubmission) -> SubmissionOutcome {
        let card = h.lifecycle.create_card("+628111", "whatsapp", "id").await.unwrap();
        h.lifecycle.submit_report(&card.card_id, &sub).await.unwrap()
    }

    fn alerts(h: &Harness) -> Vec<AlertPayload> {
        h.notifier
            .sent
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.notify_type == crate::notify::NOTIFY_LOCATION_BASED)
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_three_low_flood_reports_alert_region_subscribers() {
        let h = harness().await;
        subscription::create_subscription(h.db.pool(), "alice", "id", "whatsapp", &["R1".to_string()])
            .await
            .unwrap();

        // Two reports: below threshold, no alert.
        for _ in 0..2 {
            let outcome = submit(&h, submission("R1", DisasterType::Flood, json!({"flood_depth": 50}))).await;
            h.pipeline.run_pass("R1", outcome.report.id).await.unwrap();
        }
        assert!(alerts(&h).is_empty());

        // Third report crosses the threshold.
        let outcome = submit(&h, submission("R1", DisasterType::Flood, json!({"flood_depth": 50}))).await;
        let outcomes = h.pipeline.run_pass("R1", outcome.report.id).await.unwrap();
        assert_eq!(outcomes[0].status, DispatchStatus::Sent);

        let alerts = alerts(&h);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].user_id, "alice");
        assert_eq!(alerts[0].region_code.as_deref(), Some("R1"));
        let flood = &alerts[0].report_counts[0];
        assert_eq!(flood.count, 3);
    }

    #[tokio::test]
    async fn test_single_volcano_report_alerts_immediately() {
        let h = harness().await;
        subscription::create_subscription(h.db.pool(), "bob", "id", "whatsapp", &["R2".to_string()])
            .await
            .unwrap();

        let outcome = submit(&h, submission("R2", DisasterType::Volcano, json!({}))).await;
        let outcomes = h.pipeline.run_pass("R2", outcome.report.id).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, DispatchStatus::Sent);
        assert_eq!(alerts(&h).len(), 1);
    }

    #[tokio::test]
    async fn test_same_day_repeat_suppressed_other_region_independent() {
        let h = harness().await;
        subscription::create_subscription(
            h.db.pool(),
            "sam",
            "id",
            "whatsapp",
            &["R1".to_string(), "R3".to_string()],
        )
        .await
        .unwrap();

        // R1 crosses via a single severe report, twice in one day.
        let first = submit(&h, submission("R1", DisasterType::Volcano, json!({}))).await;
        h.pipeline.run_pass("R1", first.report.id).await.unwrap();
        let second = submit(&h, submission("R1", DisasterType::Volcano, json!({}))).await;
        let outcomes = h.pipeline.run_pass("R1", second.report.id).await.unwrap();
        assert_eq!(outcomes[0].status, DispatchStatus::Suppressed);
        assert_eq!(alerts(&h).len(), 1);

        // R3 crossing independently still alerts the same subscriber.
        let third = submit(&h, submission("R3", DisasterType::Volcano, json!({}))).await;
        let outcomes = h.pipeline.run_pass("R3", third.report.id).await.unwrap();
        assert_eq!(outcomes[0].status, DispatchStatus::Sent);
        assert_eq!(alerts(&h).len(), 2);
    }

    #[tokio::test]
    async fn test_pass_never_alerts_unrelated_regions() {
        let h = harness().await;
        subscription::create_subscription(h.db.pool(), "eve", "id", "whatsapp", &["R9".to_string()])
            .await
            .unwrap();

        // R9 is already eligible from an earlier severe report.
        let r9 = submit(&h, submission("R9", DisasterType::Volcano, json!({}))).await;

        // A new submission for R5 triggers a pass; R9's standing
        // eligibility must not leak into it.
        let r5 = submit(&h, submission("R5", DisasterType::Flood, json!({"flood_depth": 50}))).await;
        let outcomes = h.pipeline.run_pass("R5", r5.report.id).await.unwrap();
        assert!(outcomes.is_empty());

        // R9's own pass still fires.
        let outcomes = h.pipeline.run_pass("R9", r9.report.id).await.unwrap();
        assert_eq!(outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_training_submission_acks_but_never_alerts() {
        let h = harness().await;
        subscription::create_subscription(h.db.pool(), "eve", "id", "whatsapp", &["R2".to_string()])
            .await
            .unwrap();

        let mut sub = submission("R2", DisasterType::Volcano, json!({}));
        sub.is_training = true;
        let outcome = submit(&h, sub).await;
        h.pipeline.after_submission(outcome).await;

        let sent = h.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].notify_type, crate::notify::NOTIFY_THANK_YOU);
    }

    #[tokio::test]
    async fn test_web_submissions_get_no_ack() {
        let h = harness().await;

        let card = h.lifecycle.create_card("web-user", WEB_NETWORK, "en").await.unwrap();
        let outcome = h
            .lifecycle
            .submit_report(&card.card_id, &submission("R1", DisasterType::Flood, json!({"flood_depth": 50})))
            .await
            .unwrap();
        h.pipeline.after_submission(outcome).await;

        assert!(h.notifier.sent.lock().unwrap().is_empty());
    }
}
