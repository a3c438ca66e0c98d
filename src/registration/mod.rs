use std::{sync::Arc, time::Duration};

use rand::Rng;
use rand::rngs::OsRng;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    application::state::Context,
    bus::{self, Delivery, wire},
    domain::{
        error::DomainError,
        models::{RegisterWebhookRequest, RegisterWebhookResponse},
    },
    security::{crypto, webhook_id},
};

const SECRET_TOKEN_LEN: usize = 32;
const SECRET_TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
const TELEGRAM_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// §4.E Registration Consumer: drains `murmapp.hook.webhook.registration`,
/// minting a webhook id per bot and installing it against Telegram's
/// `setWebhook` API.
///
/// Runs on its own long-lived task, one delivery at a time — the upstream
/// registrations queue scales by consumer replica, not in-process
/// parallelism (spec.md §5).
pub async fn run(ctx: Arc<Context>) -> Result<(), DomainError> {
    let http_client = reqwest::Client::builder()
        .timeout(TELEGRAM_HTTP_TIMEOUT)
        .build()
        .map_err(|error| DomainError::ConfigInvalid(format!("failed to build http client: {error}")))?;

    let bus = ctx.bus.clone();
    bus.consume_registrations(Box::new(move |delivery| {
        let ctx = ctx.clone();
        let http_client = http_client.clone();
        tokio::spawn(async move {
            handle_delivery(&ctx, &http_client, delivery).await;
        });
    }))
    .await
}

/// `received → decoded → decrypted → registered-upstream →
/// response-published`, with any step terminating as `dropped` (logged).
async fn handle_delivery(ctx: &Context, http_client: &reqwest::Client, delivery: Delivery) {
    let body = delivery.body.clone();

    let request: RegisterWebhookRequest = match wire::decode(&body) {
        Ok(request) => request,
        Err(error) => {
            warn!(%error, "dropping registration request: decode failed");
            delivery.settle(false);
            return;
        }
    };

    let api_key = match crypto::aes_gcm_decrypt(ctx.payload_key(), &request.api_key_bot) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(key) => key,
            Err(error) => {
                warn!(bot_id = %request.bot_id, %error, "dropping registration request: api key is not utf-8");
                delivery.settle(false);
                return;
            }
        },
        Err(error) => {
            warn!(bot_id = %request.bot_id, %error, "dropping registration request: api key decrypt failed");
            delivery.settle(false);
            return;
        }
    };

    let secret_token = generate_secret_token();
    let webhook_id = webhook_id::compute_webhook_id(&secret_token, ctx.secret_salt());
    let webhook_url = ctx.config.webhook_url(&webhook_id);

    if let Err(error) =
        install_webhook(http_client, &api_key, &webhook_url, &secret_token).await
    {
        warn!(
            bot_id = %request.bot_id,
            %error,
            "setWebhook call failed, requeueing registration for retry"
        );
        delivery.settle(true);
        return;
    }

    let response = RegisterWebhookResponse {
        bot_id: request.bot_id.clone(),
        webhook_id: webhook_id.clone(),
    };
    let encoded = match wire::encode(&response) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(bot_id = %request.bot_id, %error, "failed to encode registration response, requeueing");
            delivery.settle(true);
            return;
        }
    };

    match ctx.bus.publish(bus::ROUTING_KEY_REGISTERED, encoded).await {
        Ok(()) => {
            info!(bot_id = %request.bot_id, webhook_id = %webhook_id, "webhook registered");
            delivery.settle(false);
        }
        Err(error) => {
            warn!(bot_id = %request.bot_id, %error, "failed to publish registration response, requeueing");
            delivery.settle(true);
        }
    }
}

/// 32 characters drawn from `[a-zA-Z0-9_-]` using the OS CSRNG.
///
/// The original service draws from a non-cryptographic PRNG here (spec.md
/// §9, acknowledged as a bug); this rewrite uses `rand::rngs::OsRng`
/// unconditionally.
fn generate_secret_token() -> String {
    let mut rng = OsRng;
    (0..SECRET_TOKEN_LEN)
        .map(|_| {
            let index = rng.gen_range(0..SECRET_TOKEN_ALPHABET.len());
            SECRET_TOKEN_ALPHABET[index] as char
        })
        .collect()
}

async fn install_webhook(
    http_client: &reqwest::Client,
    api_key: &str,
    webhook_url: &str,
    secret_token: &str,
) -> Result<(), DomainError> {
    let url = format!("https://api.telegram.org/bot{api_key}/setWebhook");
    let response = http_client
        .post(url)
        .json(&json!({
            "url": webhook_url,
            "secret_token": secret_token,
        }))
        .send()
        .await
        .map_err(|error| DomainError::UpstreamRegisterFail(error.to_string()))?;

    if response.status().as_u16() >= 300 {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(DomainError::UpstreamRegisterFail(format!(
            "setWebhook returned {status}: {text}"
        )));
    }

    Ok(())
}
