//! Per-request orchestration: partition a batch, sign once, deliver each
//! status group independently.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::metrics::{ALERTS_RECEIVED_TOTAL, CARDS_DELIVERED_TOTAL, DELIVERY_FAILURES_TOTAL};
use crate::sinks::{signature, CardBuilder, SignedPayload, Sink};
use crate::sources::{AlertBatch, AlertRecord, AlertStatus};

/// What happened to one status group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// The group was empty.
    Skipped,
    Delivered { body: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub firing: GroupOutcome,
    pub resolved: GroupOutcome,
    pub dropped: usize,
}

impl DispatchReport {
    /// Body of the most recent successful delivery, resolved group first.
    pub fn last_response(&self) -> Option<&str> {
        [&self.resolved, &self.firing]
            .into_iter()
            .find_map(|outcome| match outcome {
                GroupOutcome::Delivered { body } => Some(body.as_str()),
                _ => None,
            })
    }
}

pub struct Dispatcher {
    cards: CardBuilder,
    sink: Arc<dyn Sink>,
    secret: String,
}

impl Dispatcher {
    pub fn new(cards: CardBuilder, sink: Arc<dyn Sink>, secret: impl Into<String>) -> Self {
        Self {
            cards,
            sink,
            secret: secret.into(),
        }
    }

    pub async fn dispatch(&self, batch: AlertBatch) -> DispatchReport {
        self.dispatch_at(batch, Utc::now().timestamp()).await
    }

    /// Dispatch with an explicit signing timestamp in Unix seconds.
    pub async fn dispatch_at(&self, batch: AlertBatch, timestamp: i64) -> DispatchReport {
        let groups = batch.partition();
        ALERTS_RECEIVED_TOTAL
            .with_label_values(&[AlertStatus::Firing.as_str()])
            .inc_by(groups.firing.len() as u64);
        ALERTS_RECEIVED_TOTAL
            .with_label_values(&[AlertStatus::Resolved.as_str()])
            .inc_by(groups.resolved.len() as u64);
        ALERTS_RECEIVED_TOTAL
            .with_label_values(&[AlertStatus::Unknown.as_str()])
            .inc_by(groups.dropped as u64);

        info!(
            "Processing {} firing and {} resolved alerts ({} dropped)",
            groups.firing.len(),
            groups.resolved.len(),
            groups.dropped
        );

        let sign = signature::sign(timestamp, &self.secret);

        let firing = self
            .deliver_group(&groups.firing, AlertStatus::Firing, timestamp, &sign)
            .await;
        let resolved = self
            .deliver_group(&groups.resolved, AlertStatus::Resolved, timestamp, &sign)
            .await;

        DispatchReport {
            firing,
            resolved,
            dropped: groups.dropped,
        }
    }

    async fn deliver_group(
        &self,
        alerts: &[AlertRecord],
        status: AlertStatus,
        timestamp: i64,
        sign: &str,
    ) -> GroupOutcome {
        if alerts.is_empty() {
            return GroupOutcome::Skipped;
        }

        let card = match self.cards.build(alerts, status == AlertStatus::Firing) {
            Ok(card) => card,
            Err(e) => {
                error!("Failed to build {} card: {}", status.as_str(), e);
                DELIVERY_FAILURES_TOTAL.with_label_values(&["build"]).inc();
                return GroupOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let payload = SignedPayload::new(timestamp, sign.to_string(), card);
        match self.sink.deliver(&payload).await {
            Ok(response) => {
                info!(
                    "Delivered {} card with {} alert(s) via {} after {} attempt(s)",
                    status.as_str(),
                    alerts.len(),
                    self.sink.name(),
                    response.attempts
                );
                CARDS_DELIVERED_TOTAL.inc();
                GroupOutcome::Delivered {
                    body: response.body,
                }
            }
            Err(e) => {
                error!("Failed to send {} card: {}", status.as_str(), e);
                DELIVERY_FAILURES_TOTAL.with_label_values(&["deliver"]).inc();
                GroupOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
