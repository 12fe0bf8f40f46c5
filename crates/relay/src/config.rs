use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::sinks::RetryPolicy;
use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 9527;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub delivery: DeliveryConfig,
    pub log_level: String,
    /// Deployment environment shown on every card when set.
    pub run_environment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub secret: String,
}

// The secret never reaches the logs.
impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .field("secret", &if self.secret.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let url = var("FEISHU_WEBHOOK")
            .ok_or_else(|| Error::Config("FEISHU_WEBHOOK must be set".to_string()))?;
        url::Url::parse(&url)
            .map_err(|e| Error::Config(format!("FEISHU_WEBHOOK is not a valid URL: {}", e)))?;

        let secret = lookup("FEISHU_SECRET").unwrap_or_default();

        let port: u16 = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;
        let timeout_secs: u64 = parse_or(var("DELIVERY_TIMEOUT_SECS"), "DELIVERY_TIMEOUT_SECS", 5)?;
        let max_attempts: u32 = parse_or(var("DELIVERY_MAX_ATTEMPTS"), "DELIVERY_MAX_ATTEMPTS", 3)?;
        let delay_secs: u64 =
            parse_or(var("DELIVERY_RETRY_DELAY_SECS"), "DELIVERY_RETRY_DELAY_SECS", 10)?;

        Ok(Config {
            server: ServerConfig {
                addr: format!("0.0.0.0:{}", port),
            },
            webhook: WebhookConfig { url, secret },
            delivery: DeliveryConfig {
                timeout: Duration::from_secs(timeout_secs),
                retry: RetryPolicy::new(max_attempts, Duration::from_secs(delay_secs)),
            },
            log_level: var("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string())
                .to_lowercase(),
            run_environment: var("RUN_ENVIRONMENT"),
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} has invalid value {:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}
