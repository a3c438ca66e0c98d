use tracing::warn;

use crate::{
    application::state::Context,
    bus::{self, wire},
    domain::models::{EncryptedTelegramId, TelegramIdentity},
    security::crypto,
};

/// §4.D ID Publisher: for each deduplicated `(TelegramXId, plain_id)` pair,
/// RSA-encrypt the plaintext id under the caster's public key and publish
/// to `telegram.encrypted.id`, in the order the privacy filter discovered
/// them.
///
/// Failures on individual ids are logged and skipped — by the time this
/// runs, the redacted payload (§4.C) has already been published, so a
/// single id failing to re-publish must not fail the request.
pub async fn publish_ids(ctx: &Context, telegram_ids: &[TelegramIdentity]) {
    for identity in telegram_ids {
        if let Err(error) = publish_one(ctx, identity).await {
            warn!(
                telegram_xid = %identity.telegram_xid,
                %error,
                "failed to publish encrypted telegram id, skipping"
            );
        }
    }
}

async fn publish_one(
    ctx: &Context,
    identity: &TelegramIdentity,
) -> Result<(), crate::domain::error::DomainError> {
    let encrypted_id = crypto::rsa_encrypt_id(ctx.caster_public_key(), &identity.plain_id)?;

    let message = EncryptedTelegramId {
        telegram_xid: identity.telegram_xid.clone(),
        encrypted_id,
    };
    let body = wire::encode(&message)?;

    ctx.bus.publish(bus::ROUTING_KEY_ENCRYPTED_ID, body).await
}
