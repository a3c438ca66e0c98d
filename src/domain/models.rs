use serde::{Deserialize, Serialize};

/// Hex-encoded `SHA1(secret_token || secret_salt)`, always 40 characters.
///
/// Opaque derivation only — not a security boundary. See `security::webhook_id`.
pub type WebhookId = String;

/// Hex-encoded `SHA256(plain_id || secret_salt)`, always 64 characters.
pub type PseudonymousId = String;

/// A dot-separated JSON path loaded from `privacy_keys.conf`.
///
/// The terminal segment decides the policy applied at the matched leaf: `id`
/// triggers pseudonymization, anything else triggers `[redacted]` (modulo the
/// public-channel exemption). See `privacy::filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyRule {
    pub segments: Vec<String>,
}

impl PrivacyRule {
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split('.').map(str::to_owned).collect(),
        }
    }

    #[must_use]
    pub fn terminal(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// One deduplicated `(pseudonym, plaintext)` pair discovered while redacting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramIdentity {
    pub telegram_xid: PseudonymousId,
    pub plain_id: String,
}

/// The result of running the privacy filter over one inbound payload.
#[derive(Debug, Clone)]
pub struct FilterResult {
    pub redacted_json: Vec<u8>,
    pub matched: usize,
    pub telegram_ids: Vec<TelegramIdentity>,
}

/// Wire form published to `telegram.messages.in`.
///
/// `encrypted_payload` is AES-GCM of the redacted JSON under the payload
/// key, framed as `nonce (12 bytes) || ciphertext || tag`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramWebhookPayload {
    pub webhook_id: String,
    pub encrypted_payload: Vec<u8>,
    pub received_at_unix: i64,
}

/// Wire form published to `telegram.encrypted.id`.
///
/// `encrypted_id` is RSA-OAEP of the UTF-8 plaintext id under the caster's
/// public key. The plaintext id never appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedTelegramId {
    pub telegram_xid: String,
    pub encrypted_id: Vec<u8>,
}

/// Wire form consumed from `webhook.registration`.
///
/// `api_key_bot` is AES-GCM ciphertext under the payload key, same framing
/// as `TelegramWebhookPayload::encrypted_payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWebhookRequest {
    pub bot_id: String,
    pub api_key_bot: Vec<u8>,
}

/// Wire form published to `webhook.registered`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWebhookResponse {
    pub bot_id: String,
    pub webhook_id: String,
}
