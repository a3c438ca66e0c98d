use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use clap::Parser;
use rsa::RsaPublicKey;

use crate::{domain::error::DomainError, security::crypto};

const DEFAULT_APP_PORT: u16 = 8080;
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_JSON_LOGS: bool = false;

/// The build-time master key, forwarded into the binary by `build.rs` as
/// `TELEHOOK_MASTER_KEY_B64`. Decrypts `SECRET_SALT` and
/// `PAYLOAD_ENCRYPTION_KEY`; never read from the runtime environment.
const MASTER_KEY_B64: &str = env!("TELEHOOK_MASTER_KEY_B64");

#[derive(Debug, Clone, Parser)]
#[command(
    name = "telehook-core",
    version,
    about = "Telehook Core: privacy-preserving Telegram webhook ingress"
)]
pub struct Args {
    #[arg(long, env = "APP_PORT")]
    pub app_port: Option<u16>,

    #[arg(long, env = "WEB_HOOK_PATH")]
    pub web_hook_path: String,

    #[arg(long, env = "WEB_HOOK_HOST")]
    pub web_hook_host: String,

    #[arg(long, env = "RABBITMQ_URL")]
    pub rabbitmq_url: String,

    /// Base64 AES-GCM ciphertext of the deployment-wide secret salt.
    #[arg(long, env = "SECRET_SALT")]
    pub secret_salt: String,

    /// Base64 AES-GCM ciphertext of the 32-byte payload encryption key.
    #[arg(long, env = "PAYLOAD_ENCRYPTION_KEY")]
    pub payload_encryption_key: String,

    /// Unpadded base64 of a PKIX/SPKI DER-encoded RSA public key.
    #[arg(long, env = "CASTER_PUBLIC_KEY_RAW_BASE64")]
    pub caster_public_key_raw_base64: String,

    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    #[arg(long, env = "TELEHOOK_JSON_LOGS")]
    pub json_logs: Option<bool>,
}

/// Process-wide immutable state, decrypted and parsed once at startup. See
/// `application::state::Context` for how this is threaded through the
/// pipeline.
pub struct RuntimeConfig {
    pub app_port: u16,
    pub web_hook_path: String,
    pub web_hook_host: String,
    pub rabbitmq_url: String,
    pub secret_salt: Vec<u8>,
    pub payload_key: [u8; 32],
    pub caster_public_key: RsaPublicKey,
    pub log_filter: String,
    pub json_logs: bool,
}

impl RuntimeConfig {
    pub fn from_args(args: Args) -> Result<Self, DomainError> {
        let master_key = decode_master_key()?;

        let app_port = args.app_port.unwrap_or(DEFAULT_APP_PORT);
        if app_port == 0 {
            return Err(DomainError::ConfigInvalid(
                "APP_PORT must be greater than 0".to_owned(),
            ));
        }

        let web_hook_path = normalize_path(&args.web_hook_path)?;

        let secret_salt_ciphertext = STANDARD.decode(args.secret_salt.trim()).map_err(|error| {
            DomainError::ConfigInvalid(format!("SECRET_SALT is not valid base64: {error}"))
        })?;
        let secret_salt = crypto::aes_gcm_decrypt(&master_key, &secret_salt_ciphertext)
            .map_err(|error| DomainError::ConfigInvalid(format!("SECRET_SALT: {error}")))?;

        let payload_key_ciphertext = STANDARD
            .decode(args.payload_encryption_key.trim())
            .map_err(|error| {
                DomainError::ConfigInvalid(format!(
                    "PAYLOAD_ENCRYPTION_KEY is not valid base64: {error}"
                ))
            })?;
        let payload_key_bytes = crypto::aes_gcm_decrypt(&master_key, &payload_key_ciphertext)
            .map_err(|error| DomainError::ConfigInvalid(format!("PAYLOAD_ENCRYPTION_KEY: {error}")))?;
        let payload_key: [u8; 32] = payload_key_bytes.try_into().map_err(|bytes: Vec<u8>| {
            DomainError::ConfigInvalid(format!(
                "PAYLOAD_ENCRYPTION_KEY must decrypt to exactly 32 bytes, got {}",
                bytes.len()
            ))
        })?;

        let caster_public_key_der = STANDARD_NO_PAD
            .decode(args.caster_public_key_raw_base64.trim())
            .map_err(|error| {
                DomainError::ConfigInvalid(format!(
                    "CASTER_PUBLIC_KEY_RAW_BASE64 is not valid raw base64: {error}"
                ))
            })?;
        let caster_public_key = crypto::parse_rsa_public_key_der(&caster_public_key_der)?;

        let log_filter =
            normalize_non_empty(args.log_filter).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());
        let json_logs = args.json_logs.unwrap_or(DEFAULT_JSON_LOGS);

        if args.web_hook_host.trim().is_empty() {
            return Err(DomainError::ConfigInvalid(
                "WEB_HOOK_HOST must not be empty".to_owned(),
            ));
        }
        if args.rabbitmq_url.trim().is_empty() {
            return Err(DomainError::ConfigInvalid(
                "RABBITMQ_URL must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            app_port,
            web_hook_path,
            web_hook_host: args.web_hook_host.trim_end_matches('/').to_owned(),
            rabbitmq_url: args.rabbitmq_url,
            secret_salt,
            payload_key,
            caster_public_key,
            log_filter,
            json_logs,
        })
    }

    /// `WEB_HOOK_HOST + WEB_HOOK_PATH + "/" + webhook_id`, per spec.md §4.E.5.
    #[must_use]
    pub fn webhook_url(&self, webhook_id: &str) -> String {
        format!("{}{}/{}", self.web_hook_host, self.web_hook_path, webhook_id)
    }

    /// A config with a freshly generated RSA key and fixed secrets, for
    /// unit and integration tests.
    #[must_use]
    #[cfg(any(test, feature = "test-util"))]
    pub fn for_test() -> Self {
        use rsa::RsaPrivateKey;

        let private_key =
            RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("rsa key generation");
        Self {
            app_port: 8080,
            web_hook_path: "/hooks/telegram".to_owned(),
            web_hook_host: "https://ingress.example.test".to_owned(),
            rabbitmq_url: "amqp://localhost//".to_owned(),
            secret_salt: b"testSecretSalt".to_vec(),
            payload_key: [7u8; 32],
            caster_public_key: RsaPublicKey::from(&private_key),
            log_filter: "warn".to_owned(),
            json_logs: false,
        }
    }
}

fn decode_master_key() -> Result<[u8; 32], DomainError> {
    let bytes = STANDARD.decode(MASTER_KEY_B64.trim()).map_err(|error| {
        DomainError::ConfigInvalid(format!("compiled-in master key is not valid base64: {error}"))
    })?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        DomainError::ConfigInvalid(format!(
            "compiled-in master key must be exactly 32 bytes, got {}",
            bytes.len()
        ))
    })
}

fn normalize_path(input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() || !trimmed.starts_with('/') {
        return Err(DomainError::ConfigInvalid(
            "WEB_HOOK_PATH must be a non-empty path starting with '/'".to_owned(),
        ));
    }
    Ok(trimmed.to_owned())
}

fn normalize_non_empty(input: Option<String>) -> Option<String> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_path;

    #[test]
    fn normalize_path_strips_trailing_slash() {
        assert_eq!(normalize_path("/hooks/telegram/").unwrap(), "/hooks/telegram");
    }

    #[test]
    fn normalize_path_rejects_missing_leading_slash() {
        assert!(normalize_path("hooks/telegram").is_err());
    }

    #[test]
    fn normalize_path_rejects_empty() {
        assert!(normalize_path("   ").is_err());
    }
}
