use telehook_core::{bus::wire, domain::models::TelegramWebhookPayload, security::webhook_id};

use super::support::spawn_server;

const TELEGRAM_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// spec.md §8 scenario 7: a matching payload dual-publishes — exactly one
/// redacted payload message, and exactly one encrypted-id message per
/// distinct id the filter discovered, payload first.
#[tokio::test]
async fn matching_payload_publishes_redacted_payload_then_encrypted_ids() {
    let server = spawn_server().await;
    let token = "abc123";
    let claimed_webhook_id = webhook_id::compute_webhook_id(token, &server.config.secret_salt);

    let client = reqwest::Client::new();
    let url = format!(
        "http://{}{}/{}",
        server.addr, server.config.web_hook_path, claimed_webhook_id
    );
    let body = serde_json::json!({
        "message": {
            "from": {"id": 123, "first_name": "Eugene"},
            "chat": {"id": 123}
        }
    });

    let response = client
        .post(&url)
        .header(TELEGRAM_SECRET_HEADER, token)
        .json(&body)
        .send()
        .await
        .expect("webhook request should send");

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let published = server.bus.published();
    assert_eq!(published.len(), 2, "one payload message, one encrypted id message");
    assert_eq!(published[0].0, telehook_core::bus::ROUTING_KEY_MESSAGES_IN);
    assert_eq!(published[1].0, telehook_core::bus::ROUTING_KEY_ENCRYPTED_ID);

    let payload: TelegramWebhookPayload = wire::decode(&published[0].1).expect("decode payload");
    assert_eq!(payload.webhook_id, claimed_webhook_id);

    server.stop().await;
}

#[tokio::test]
async fn wrong_secret_token_is_rejected_without_publishing() {
    let server = spawn_server().await;
    let claimed_webhook_id = webhook_id::compute_webhook_id("abc123", &server.config.secret_salt);

    let client = reqwest::Client::new();
    let url = format!(
        "http://{}{}/{}",
        server.addr, server.config.web_hook_path, claimed_webhook_id
    );

    let response = client
        .post(&url)
        .header(TELEGRAM_SECRET_HEADER, "wrong-token")
        .body("{}")
        .send()
        .await
        .expect("webhook request should send");

    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    assert!(server.bus.published().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn payload_with_no_rule_matches_is_silently_dropped() {
    let server = spawn_server().await;
    let token = "abc123";
    let claimed_webhook_id = webhook_id::compute_webhook_id(token, &server.config.secret_salt);

    let client = reqwest::Client::new();
    let url = format!(
        "http://{}{}/{}",
        server.addr, server.config.web_hook_path, claimed_webhook_id
    );

    let response = client
        .post(&url)
        .header(TELEGRAM_SECRET_HEADER, token)
        .json(&serde_json::json!({"message": {"from": {"uuid": 1}}}))
        .send()
        .await
        .expect("webhook request should send");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(server.bus.published().is_empty());

    server.stop().await;
}
