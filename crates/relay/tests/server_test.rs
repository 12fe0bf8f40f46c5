use alert_relay::{
    config::{Config, DeliveryConfig},
    dispatch::Dispatcher,
    server::Server,
    sinks::{signature, CardBuilder, RetryPolicy, SignedPayload, WebhookClient},
};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOOK_PATH: &str = "/open-apis/bot/v2/hook/test";

fn relay(chat: &MockServer, environment: Option<&str>) -> axum_test::TestServer {
    let client = WebhookClient::new(
        format!("{}{}", chat.uri(), HOOK_PATH),
        Duration::from_secs(5),
        RetryPolicy::new(3, Duration::from_millis(10)),
    )
    .unwrap();
    let dispatcher = Dispatcher::new(
        CardBuilder::new(environment.map(String::from)),
        Arc::new(client),
        "s3cret",
    );

    axum_test::TestServer::new(Server::new(dispatcher).build_router()).unwrap()
}

async fn received_payloads(chat: &MockServer) -> Vec<SignedPayload> {
    chat.received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.body_json::<SignedPayload>().unwrap())
        .collect()
}

fn alertmanager_body() -> Value {
    json!({
        "receiver": "feishu",
        "status": "firing",
        "alerts": [
            {
                "status": "firing",
                "labels": {
                    "alertname": "HighCPU",
                    "instance": "10.0.0.1:9100",
                    "namespace": "payments",
                    "pod": "api-7d9f",
                    "severity": "critical"
                },
                "annotations": {"summary": "CPU high", "description": "CPU > 90%"},
                "startsAt": "2024-01-01T00:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z"
            },
            {
                "status": "resolved",
                "labels": {"alertname": "DiskFull", "instance": "10.0.0.2:9100"},
                "annotations": {"summary": "Disk full"},
                "startsAt": "2024-01-01T00:00:00Z",
                "endsAt": "2024-01-01T03:15:00Z"
            },
            {
                "status": "silenced",
                "labels": {"alertname": "Ignored"}
            }
        ],
        "groupLabels": {"alertname": "HighCPU"},
        "externalURL": "http://alertmanager:9093",
        "version": "4",
        "groupKey": "{}:{}"
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let chat = MockServer::start().await;
    let client = relay(&chat, None);

    let response = client.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let chat = MockServer::start().await;
    let client = relay(&chat, None);

    let response = client.get("/metrics").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_relays_each_status_group() {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":0,"msg":"success"}"#))
        .expect(2)
        .mount(&chat)
        .await;
    let client = relay(&chat, Some("prod"));

    let response = client.post("/webhook").json(&alertmanager_body()).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["resp"], r#"{"code":0,"msg":"success"}"#);

    let payloads = received_payloads(&chat).await;
    assert_eq!(payloads.len(), 2);

    let (firing, resolved) = (&payloads[0], &payloads[1]);
    assert_eq!(firing.timestamp, resolved.timestamp);
    assert_eq!(firing.sign, resolved.sign);
    let timestamp: i64 = firing.timestamp.parse().unwrap();
    assert_eq!(firing.sign, signature::sign(timestamp, "s3cret"));

    let firing_json = serde_json::to_value(&firing.card).unwrap();
    assert_eq!(firing_json["header"]["template"], "red");
    assert_eq!(firing_json["header"]["title"]["content"], "🚨 alert 🚨");
    assert_eq!(firing_json["elements"].as_array().unwrap().len(), 1);
    let firing_block = firing_json["elements"][0]["content"].as_str().unwrap();
    assert!(firing_block.contains("<font color='red'>10.0.0.1</font>"));
    assert!(firing_block.contains("<font color='red'>prod</font>"));
    assert!(firing_block.contains("<font color='red'>2024-01-01 08:00:00</font>"));
    assert!(!firing_block.contains("Resolved at"));

    let resolved_json = serde_json::to_value(&resolved.card).unwrap();
    assert_eq!(resolved_json["header"]["template"], "green");
    let resolved_block = resolved_json["elements"][0]["content"].as_str().unwrap();
    assert!(resolved_block.contains("DiskFull"));
    assert!(resolved_block.contains("<font color='green'>2024-01-01 11:15:00</font>"));
    assert!(!resolved_block.contains("Severity"));
}

#[tokio::test]
async fn test_webhook_ignores_content_type() {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&chat)
        .await;
    let client = relay(&chat, None);

    let body = json!({"alerts": [{"status": "firing", "labels": {"alertname": "A"}}]});
    let response = client.post("/webhook").text(body.to_string()).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["resp"], "ok");
}

#[tokio::test]
async fn test_webhook_with_nothing_to_send() {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&chat)
        .await;
    let client = relay(&chat, None);

    let response = client
        .post("/webhook")
        .json(&json!({"alerts": [{"status": "silenced"}]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body, json!({"status": "ok", "resp": null}));
}

#[tokio::test]
async fn test_webhook_tolerates_null_fields() {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(HOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&chat)
        .await;
    let client = relay(&chat, None);

    let body = json!({
        "receiver": null,
        "version": 4,
        "alerts": [
            {"status": "firing", "labels": {"alertname": "A", "instance": null}, "annotations": null},
            {"status": null},
            {"status": 7, "labels": null}
        ]
    });
    let response = client.post("/webhook").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["resp"], "ok");
    assert_eq!(received_payloads(&chat).await.len(), 1);
}

#[tokio::test]
async fn test_webhook_rejects_malformed_body() {
    let chat = MockServer::start().await;
    let client = relay(&chat, None);

    let response = client.post("/webhook").text("{not json").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().starts_with("Bad request"));
}

#[tokio::test]
async fn test_delivery_failure_is_still_acknowledged() {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&chat)
        .await;
    let client = relay(&chat, None);

    let response = client
        .post("/webhook")
        .json(&json!({"alerts": [{"status": "firing"}]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["resp"], Value::Null);
}

#[tokio::test]
async fn test_server_from_config() {
    let chat = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&chat)
        .await;

    let url = format!("{}{}", chat.uri(), HOOK_PATH);
    let mut config = Config::from_lookup(|key| match key {
        "FEISHU_WEBHOOK" => Some(url.clone()),
        "FEISHU_SECRET" => Some("s3cret".to_string()),
        _ => None,
    })
    .unwrap();
    config.delivery = DeliveryConfig {
        retry: RetryPolicy::new(1, Duration::ZERO),
        ..DeliveryConfig::default()
    };

    let server = Server::from_config(&config).unwrap();
    let client = axum_test::TestServer::new(server.build_router()).unwrap();

    let response = client
        .post("/webhook")
        .json(&json!({"alerts": [{"status": "resolved", "endsAt": "2024-01-01T00:00:00Z"}]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let payloads = received_payloads(&chat).await;
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].msg_type, "interactive");
}
