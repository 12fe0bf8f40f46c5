//! Interactive card rendering for a group of same-status alerts.

use serde::{Deserialize, Serialize};

use crate::sources::AlertRecord;
use crate::time::to_local_display;
use crate::{Error, Result};

pub const FIRING_TITLE: &str = "🚨 alert 🚨";
pub const RESOLVED_TITLE: &str = "✅ resolved ✅";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationCard {
    pub config: CardConfig,
    pub header: CardHeader,
    pub elements: Vec<CardElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardConfig {
    pub wide_screen_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardHeader {
    pub title: CardText,
    pub template: CardColor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum CardText {
    PlainText { content: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum CardElement {
    Markdown { content: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Red,
    Green,
}

impl CardColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardColor::Red => "red",
            CardColor::Green => "green",
        }
    }
}

/// Builds one card per status group.
#[derive(Debug, Clone, Default)]
pub struct CardBuilder {
    environment: Option<String>,
}

impl CardBuilder {
    pub fn new(environment: Option<String>) -> Self {
        Self {
            environment: environment.filter(|env| !env.is_empty()),
        }
    }

    /// Render `alerts` into a card styled for firing or resolved alerts.
    ///
    /// Every alert must share the status implied by `is_firing`. Only resolved
    /// cards show a recovery time. A malformed timestamp fails the whole card.
    pub fn build(&self, alerts: &[AlertRecord], is_firing: bool) -> Result<NotificationCard> {
        if alerts.is_empty() {
            return Err(Error::Validation(
                "cannot build a card without alerts".to_string(),
            ));
        }

        let (color, title) = if is_firing {
            (CardColor::Red, FIRING_TITLE)
        } else {
            (CardColor::Green, RESOLVED_TITLE)
        };

        let elements = alerts
            .iter()
            .map(|alert| {
                self.render_block(alert, is_firing, color)
                    .map(|content| CardElement::Markdown { content })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(NotificationCard {
            config: CardConfig {
                wide_screen_mode: true,
            },
            header: CardHeader {
                title: CardText::PlainText {
                    content: title.to_string(),
                },
                template: color,
            },
            elements,
        })
    }

    fn render_block(&self, alert: &AlertRecord, is_firing: bool, color: CardColor) -> Result<String> {
        let labels = &alert.labels;
        let annotations = &alert.annotations;
        let start = to_local_display(alert.starts_at.as_deref().unwrap_or_default())?;
        let end = if is_firing {
            String::new()
        } else {
            to_local_display(alert.ends_at.as_deref().unwrap_or_default())?
        };

        let mut content = String::new();
        push_line(&mut content, "Alert name", color, &labels.alertname);
        push_line(&mut content, "Summary", color, &annotations.summary);
        push_line(&mut content, "Details", color, &annotations.description);
        push_line(&mut content, "Instance", color, labels.host());
        push_line(&mut content, "Namespace", color, &labels.namespace);
        push_line(&mut content, "Pod", color, &labels.pod);

        if let Some(environment) = &self.environment {
            push_line(&mut content, "Environment", color, environment);
        }
        if !labels.severity.is_empty() {
            push_line(&mut content, "Severity", color, &labels.severity);
        }

        push_line(&mut content, "Started at", color, &start);
        if !end.is_empty() {
            push_line(&mut content, "Resolved at", color, &end);
        }

        Ok(content)
    }
}

fn push_line(content: &mut String, label: &str, color: CardColor, value: &str) {
    content.push_str(&format!(
        "- **{}**: <font color='{}'>{}</font>\n",
        label,
        color.as_str(),
        value
    ));
}
