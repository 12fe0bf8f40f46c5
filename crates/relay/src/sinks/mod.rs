pub mod card;
pub mod signature;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use self::card::NotificationCard;

pub use card::CardBuilder;
pub use webhook::{RetryPolicy, WebhookClient};

/// Message type tag the chat platform expects for card messages.
pub const INTERACTIVE_MSG_TYPE: &str = "interactive";

/// Wire body posted to the chat-bot webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedPayload {
    /// Unix seconds, sent as a string.
    pub timestamp: String,
    pub sign: String,
    pub msg_type: String,
    pub card: NotificationCard,
}

impl SignedPayload {
    pub fn new(timestamp: i64, sign: String, card: NotificationCard) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            sign,
            msg_type: INTERACTIVE_MSG_TYPE.to_string(),
            card,
        }
    }
}

/// Successful response from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: String,
    pub attempts: u32,
}

/// Destination for signed notification cards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, payload: &SignedPayload) -> Result<DeliveryResponse>;
}
