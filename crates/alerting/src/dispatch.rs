//! Concurrent notification fan-out behind the dedup gate.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use sqlx::SqlitePool;

use database::dedup_log;

use crate::aggregate::RegionCount;
use crate::error::Result;
use crate::matcher::AlertMatch;
use crate::notify::{AlertPayload, Notifier, NOTIFY_LOCATION_BASED};

/// What happened to one (subscriber, region) match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Invocation accepted and dedup entry written.
    Sent,
    /// An alert was already logged for this subscriber/region today.
    Suppressed,
    /// The invocation failed; logged, never retried here.
    Failed,
}

/// Per-match dispatch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub user_id: String,
    pub region_code: String,
    pub status: DispatchStatus,
}

/// Fans alert invocations out to the notification channel.
#[derive(Clone)]
pub struct Dispatcher {
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// Dispatch alerts for every match, concurrently.
    ///
    /// Each match is gated through the dedup log, invoked, and logged
    /// independently: one failing invocation never blocks or fails its
    /// siblings, and every failure is swallowed into its outcome.
    pub async fn dispatch(
        &self,
        matches: &[AlertMatch],
        counts: &[RegionCount],
        report_id: i64,
    ) -> Vec<DispatchOutcome> {
        let invocations = matches.iter().map(|m| async move {
            let status = match self.deliver(m, counts, report_id).await {
                Ok(status) => status,
                Err(err) => {
                    tracing::warn!(
                        user_id = %m.user_id,
                        region_code = %m.region_code,
                        error = %err,
                        "Alert dispatch failed"
                    );
                    DispatchStatus::Failed
                }
            };
            DispatchOutcome {
                user_id: m.user_id.clone(),
                region_code: m.region_code.clone(),
                status,
            }
        });

        let outcomes = join_all(invocations).await;

        let sent = outcomes.iter().filter(|o| o.status == DispatchStatus::Sent).count();
        tracing::info!(matches = matches.len(), sent, "Alert dispatch complete");
        outcomes
    }

    /// Gate one match through the dedup log and invoke the channel.
    async fn deliver(
        &self,
        m: &AlertMatch,
        counts: &[RegionCount],
        report_id: i64,
    ) -> Result<DispatchStatus> {
        let now = Utc::now();
        if dedup_log::sent_today(&self.pool, &m.user_id, &m.region_code, now.date_naive()).await? {
            tracing::debug!(
                user_id = %m.user_id,
                region_code = %m.region_code,
                "Alert suppressed by dedup log"
            );
            return Ok(DispatchStatus::Suppressed);
        }

        let payload = AlertPayload {
            user_id: m.user_id.clone(),
            notify_type: NOTIFY_LOCATION_BASED.to_string(),
            language: m.language_code.clone(),
            network: m.network.clone(),
            region_code: Some(m.region_code.clone()),
            report_counts: counts.to_vec(),
            report_id: Some(report_id),
        };
        self.notifier.notify(&payload).await?;

        // The unique index absorbs a concurrent writer that got here first.
        let logged =
            dedup_log::record_sent(&self.pool, &m.user_id, &m.region_code, &m.network, now).await?;
        if !logged {
            tracing::debug!(
                user_id = %m.user_id,
                region_code = %m.region_code,
                "Dedup entry already logged by a concurrent pass"
            );
        }

        Ok(DispatchStatus::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertingError;
    use crate::severity::Severity;
    use async_trait::async_trait;
    use database::{Database, DisasterType};
    use std::sync::Mutex;

    /// Records every payload it is invoked with.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<AlertPayload>>,
        fail_for_user: Option<String>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, payload: &AlertPayload) -> std::result::Result<(), AlertingError> {
            if self.fail_for_user.as_deref() == Some(payload.user_id.as_str()) {
                return Err(AlertingError::Dispatch("channel unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn alert_match(user: &str, region: &str) -> AlertMatch {
        AlertMatch {
            user_id: user.to_string(),
            language_code: "id".to_string(),
            network: "whatsapp".to_string(),
            region_code: region.to_string(),
        }
    }

    fn counts() -> Vec<RegionCount> {
        vec![RegionCount {
            region_code: "R1".to_string(),
            disaster_type: DisasterType::Flood,
            count: 3,
            city: "Jakarta".to_string(),
            latest_report_id: 9,
            latest_severity: Severity::Low,
        }]
    }

    #[tokio::test]
    async fn test_dispatch_sends_and_logs() {
        let db = test_db().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Dispatcher::new(db.pool().clone(), notifier.clone());

        let matches = vec![alert_match("alice", "R1"), alert_match("bob", "R1")];
        let outcomes = dispatcher.dispatch(&matches, &counts(), 9).await;

        assert!(outcomes.iter().all(|o| o.status == DispatchStatus::Sent));
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].notify_type, NOTIFY_LOCATION_BASED);
        assert_eq!(sent[0].region_code.as_deref(), Some("R1"));
        assert_eq!(sent[0].report_counts.len(), 1);
    }

    #[tokio::test]
    async fn test_second_dispatch_same_day_is_suppressed() {
        let db = test_db().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Dispatcher::new(db.pool().clone(), notifier.clone());

        let matches = vec![alert_match("alice", "R1")];
        dispatcher.dispatch(&matches, &counts(), 9).await;
        let outcomes = dispatcher.dispatch(&matches, &counts(), 10).await;

        assert_eq!(outcomes[0].status, DispatchStatus::Suppressed);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_failure_never_blocks_siblings() {
        let db = test_db().await;
        let notifier = Arc::new(RecordingNotifier {
            sent: Mutex::new(Vec::new()),
            fail_for_user: Some("alice".to_string()),
        });
        let dispatcher = Dispatcher::new(db.pool().clone(), notifier.clone());

        let matches = vec![alert_match("alice", "R1"), alert_match("bob", "R1")];
        let outcomes = dispatcher.dispatch(&matches, &counts(), 9).await;

        assert_eq!(outcomes[0].status, DispatchStatus::Failed);
        assert_eq!(outcomes[1].status, DispatchStatus::Sent);

        // No dedup entry for the failed invocation, so it can retry on
        // the next pass; the successful one is logged.
        let today = Utc::now().date_naive();
        assert!(!dedup_log::sent_today(db.pool(), "alice", "R1", today).await.unwrap());
        assert!(dedup_log::sent_today(db.pool(), "bob", "R1", today).await.unwrap());
    }

    #[tokio::test]
    async fn test_dispatch_of_independent_regions() {
        let db = test_db().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Dispatcher::new(db.pool().clone(), notifier.clone());

        // Same subscriber, two regions: evaluated independently.
        let matches = vec![alert_match("alice", "R1"), alert_match("alice", "R3")];
        let outcomes = dispatcher.dispatch(&matches, &counts(), 9).await;
        assert!(outcomes.iter().all(|o| o.status == DispatchStatus::Sent));
    }
}
