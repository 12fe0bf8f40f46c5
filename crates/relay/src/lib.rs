pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod server;
pub mod sinks;
pub mod sources;
pub mod time;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Invalid timestamp {value:?}: {source}")]
    TimeParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Webhook returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Delivery failed after {attempts} attempt(s): {last_error}")]
    Delivery { attempts: u32, last_error: String },
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
