use crate::{
    application::state::Context,
    bus::{self, wire},
    domain::{error::DomainError, models::TelegramWebhookPayload},
    security::crypto,
};

/// §4.C Payload Publisher: symmetric-encrypt the redacted JSON, frame it
/// with the webhook id and timestamp, publish to `telegram.messages.in`.
///
/// Cipher-init failures and broker publish failures both propagate as-is —
/// the caller (the HTTP handler) turns either into a 500, since the
/// redacted payload is the primary artifact this request exists to emit.
pub async fn publish_payload(
    ctx: &Context,
    webhook_id: &str,
    redacted_json: &[u8],
    received_at_unix: i64,
) -> Result<(), DomainError> {
    let encrypted_payload = crypto::aes_gcm_encrypt(ctx.payload_key(), redacted_json)?;

    let message = TelegramWebhookPayload {
        webhook_id: webhook_id.to_owned(),
        encrypted_payload,
        received_at_unix,
    };
    let body = wire::encode(&message)?;

    ctx.bus.publish(bus::ROUTING_KEY_MESSAGES_IN, body).await
}
