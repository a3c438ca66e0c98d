use axum::{
    body::{Bytes, to_bytes},
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{info, warn};

use crate::{
    application::state::SharedContext,
    domain::error::DomainError,
    privacy, publish,
    security::webhook_id,
};

const TELEGRAM_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// `POST {WEB_HOOK_PATH}/{webhook_id}` — the ingress edge described in
/// spec.md §6. Verifies the webhook id (§4.A), runs the privacy filter
/// (§4.B), and dual-publishes the redacted payload (§4.C) and every
/// pseudonymous id (§4.D), in that order.
pub async fn webhook_handler(
    State(ctx): State<SharedContext>,
    Path(claimed_webhook_id): Path<String>,
    headers: HeaderMap,
    request: Request,
) -> impl IntoResponse {
    let Some(secret_token) = header_str(&headers, TELEGRAM_SECRET_HEADER) else {
        return reject(StatusCode::FORBIDDEN, "missing webhook secret token header");
    };

    if !webhook_id::verify_webhook_id(&claimed_webhook_id, secret_token, ctx.secret_salt()) {
        return reject(StatusCode::FORBIDDEN, "webhook id does not match secret token");
    }

    let body = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(error) => {
            warn!(%error, "failed to read webhook request body");
            return reject(StatusCode::BAD_REQUEST, "unreadable request body");
        }
    };

    match process_update(&ctx, &claimed_webhook_id, &body).await {
        Ok(Published { matched, ids_published }) => {
            info!(
                webhook_id = %claimed_webhook_id,
                matched,
                ids_published,
                "accepted webhook update"
            );
            StatusCode::OK.into_response()
        }
        Err(DomainError::InvalidJson(_) | DomainError::NoMatch) => {
            // Silent drop: a 200 so Telegram does not retry a payload we
            // will never be able to act on (spec.md §7).
            StatusCode::OK.into_response()
        }
        Err(error) => {
            warn!(webhook_id = %claimed_webhook_id, %error, "failed to process webhook update");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

struct Published {
    matched: usize,
    ids_published: usize,
}

async fn process_update(
    ctx: &SharedContext,
    webhook_id: &str,
    body: &Bytes,
) -> Result<Published, DomainError> {
    let result = privacy::filter_payload(body, &ctx.rules, ctx.secret_salt())?;
    let received_at_unix = now_unix();

    publish::publish_payload(ctx, webhook_id, &result.redacted_json, received_at_unix).await?;
    publish::publish_ids(ctx, &result.telegram_ids).await;

    Ok(Published {
        matched: result.matched,
        ids_published: result.telegram_ids.len(),
    })
}

fn reject(status: StatusCode, message: &'static str) -> axum::response::Response {
    (status, message).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}
