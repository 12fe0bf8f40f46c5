use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{DeliveryResponse, SignedPayload, Sink};
use crate::metrics::DELIVERY_ATTEMPTS_TOTAL;
use crate::{Error, Result};

/// Fixed-delay retry schedule for webhook delivery.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub delay: Duration,
    pub should_retry: fn(&Error) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
            should_retry: retry_any,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            ..Default::default()
        }
    }

    pub fn with_predicate(mut self, should_retry: fn(&Error) -> bool) -> Self {
        self.should_retry = should_retry;
        self
    }
}

fn retry_any(_: &Error) -> bool {
    true
}

/// Posts signed cards to a chat-bot webhook URL.
pub struct WebhookClient {
    http_client: Client,
    url: String,
    retry: RetryPolicy,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            url: url.into(),
            retry,
        })
    }

    async fn try_send(&self, payload: &SignedPayload) -> Result<(u16, String)> {
        let response = self.http_client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok((status.as_u16(), body))
        } else {
            Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl Sink for WebhookClient {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, payload: &SignedPayload) -> Result<DeliveryResponse> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            DELIVERY_ATTEMPTS_TOTAL.inc();
            debug!(
                "Attempting webhook delivery {}/{}",
                attempts, self.retry.max_attempts
            );

            let err = match self.try_send(payload).await {
                Ok((status, body)) => {
                    info!("Webhook delivered on attempt {} with status {}", attempts, status);
                    return Ok(DeliveryResponse {
                        status,
                        body,
                        attempts,
                    });
                }
                Err(e) => e,
            };

            warn!("Webhook attempt {} failed: {}", attempts, err);

            if attempts >= self.retry.max_attempts || !(self.retry.should_retry)(&err) {
                return Err(Error::Delivery {
                    attempts,
                    last_error: err.to_string(),
                });
            }

            sleep(self.retry.delay).await;
        }
    }
}
