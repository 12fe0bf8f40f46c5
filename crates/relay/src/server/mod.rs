mod routes;
mod webhook;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Config,
    dispatch::Dispatcher,
    sinks::{CardBuilder, WebhookClient},
    Result,
};

pub struct Server {
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Wire the webhook client, card builder and dispatcher from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = WebhookClient::new(
            config.webhook.url.clone(),
            config.delivery.timeout,
            config.delivery.retry,
        )?;
        let cards = CardBuilder::new(config.run_environment.clone());

        Ok(Self::new(Dispatcher::new(
            cards,
            Arc::new(client),
            config.webhook.secret.clone(),
        )))
    }

    pub fn build_router(self) -> Router {
        Router::new()
            .route("/health", get(routes::health))
            .route("/metrics", get(routes::metrics))
            .route("/webhook", post(webhook::alert_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.dispatcher)
    }

    pub async fn start(self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, self.build_router()).await?;
        Ok(())
    }
}
