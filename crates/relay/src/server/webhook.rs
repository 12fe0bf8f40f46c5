use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{dispatch::Dispatcher, sources::AlertBatch, Result};

/// Accept an Alertmanager notification and relay it as signed cards.
///
/// The body is parsed regardless of `Content-Type`. Delivery failures are
/// only logged; the response is `ok` whenever the body parsed.
#[instrument(name = "webhook", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn alert_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: Bytes,
) -> Result<Json<Value>> {
    debug!("Received alerts: {}", String::from_utf8_lossy(&body));

    let batch = AlertBatch::from_slice(&body).inspect_err(|e| {
        warn!("Rejecting webhook body: {}", e);
    })?;
    info!("Received {}", batch.describe());

    let report = dispatcher.dispatch(batch).await;
    Ok(Json(json!({
        "status": "ok",
        "resp": report.last_response(),
    })))
}
