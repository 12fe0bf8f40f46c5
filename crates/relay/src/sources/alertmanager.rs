use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Label value used when an alert carries no `alertname`.
pub const UNKNOWN_ALERT_NAME: &str = "unknown";

// AlertManager webhook payload structures
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AlertBatch {
    #[serde(default, deserialize_with = "optional_text")]
    pub receiver: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_alerts")]
    pub alerts: Vec<AlertRecord>,
    #[serde(rename = "groupKey", default, deserialize_with = "optional_text")]
    pub group_key: Option<String>,
    #[serde(rename = "externalURL", default, deserialize_with = "optional_text")]
    pub external_url: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AlertRecord {
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: AlertLabels,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: AlertAnnotations,
    #[serde(rename = "startsAt", default)]
    pub starts_at: Option<String>,
    #[serde(rename = "endsAt", default)]
    pub ends_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
    /// Anything Alertmanager (or a proxy in front of it) sends that is neither
    /// firing nor resolved, including `null` and non-string values. Such
    /// alerts are never forwarded.
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for AlertStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(status) if status == "firing" => AlertStatus::Firing,
            Value::String(status) if status == "resolved" => AlertStatus::Resolved,
            _ => AlertStatus::Unknown,
        })
    }
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Firing => "firing",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AlertLabels {
    #[serde(default = "unknown_alert_name", deserialize_with = "alert_name")]
    pub alertname: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub instance: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub namespace: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub pod: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub severity: String,
}

fn unknown_alert_name() -> String {
    UNKNOWN_ALERT_NAME.to_string()
}

// Label and annotation values are strings in practice; scalars are kept as
// text and anything else (null, objects, arrays) counts as absent.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn text_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn optional_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn alert_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_else(unknown_alert_name))
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// A record that does not fit `AlertRecord` is kept with an unknown status so
// it is dropped without failing its siblings.
fn lenient_alerts<'de, D>(deserializer: D) -> std::result::Result<Vec<AlertRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();

    Ok(values
        .into_iter()
        .map(|value| {
            AlertRecord::deserialize(value).unwrap_or_else(|e| {
                warn!("Ignoring malformed alert record: {}", e);
                AlertRecord::default()
            })
        })
        .collect())
}

impl Default for AlertLabels {
    fn default() -> Self {
        Self {
            alertname: unknown_alert_name(),
            instance: String::new(),
            namespace: String::new(),
            pod: String::new(),
            severity: String::new(),
        }
    }
}

impl AlertLabels {
    /// The `instance` label without its `:port` suffix.
    pub fn host(&self) -> &str {
        self.instance.split(':').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AlertAnnotations {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub summary: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub description: String,
}

/// Alerts of one batch split by status. Firing and resolved never share a group.
#[derive(Debug, Default)]
pub struct PartitionedAlerts {
    pub firing: Vec<AlertRecord>,
    pub resolved: Vec<AlertRecord>,
    pub dropped: usize,
}

impl AlertBatch {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::BadRequest(e.to_string()))
    }

    /// One-line description of the Alertmanager envelope for logging.
    pub fn describe(&self) -> String {
        format!(
            "{} alert(s) from receiver {} (status {}, group {}, version {}, source {})",
            self.alerts.len(),
            self.receiver.as_deref().unwrap_or("-"),
            self.status.as_deref().unwrap_or("-"),
            self.group_key.as_deref().unwrap_or("-"),
            self.version.as_deref().unwrap_or("-"),
            self.external_url.as_deref().unwrap_or("-"),
        )
    }

    pub fn partition(self) -> PartitionedAlerts {
        let mut groups = PartitionedAlerts::default();

        for alert in self.alerts {
            match alert.status {
                AlertStatus::Firing => groups.firing.push(alert),
                AlertStatus::Resolved => groups.resolved.push(alert),
                AlertStatus::Unknown => {
                    debug!("Dropping alert {} with unrecognised status", alert.labels.alertname);
                    groups.dropped += 1;
                }
            }
        }

        groups
    }
}
