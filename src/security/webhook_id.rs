use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use crate::domain::models::WebhookId;

/// `hex(SHA1(secret_token || secret_salt))`. Pure, no I/O.
///
/// SHA-1 is retained deliberately as an opaque URL-segment derivation, not a
/// security primitive — the security boundary is the attacker's inability to
/// guess `secret_token`, not collision resistance of the hash.
#[must_use]
pub fn compute_webhook_id(secret_token: &str, secret_salt: &[u8]) -> WebhookId {
    let mut hasher = Sha1::new();
    hasher.update(secret_token.as_bytes());
    hasher.update(secret_salt);
    hex::encode(hasher.finalize())
}

/// Constant-time equivalent of `compute_webhook_id(token, salt) == claimed`.
#[must_use]
pub fn verify_webhook_id(claimed: &str, secret_token: &str, secret_salt: &[u8]) -> bool {
    let expected = compute_webhook_id(secret_token, secret_salt);
    expected.as_bytes().ct_eq(claimed.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::{compute_webhook_id, verify_webhook_id};

    #[test]
    fn is_deterministic_and_verifiable() {
        let id = compute_webhook_id("abc123", b"testSecretSalt");
        assert_eq!(id.len(), 40);
        assert!(verify_webhook_id(&id, "abc123", b"testSecretSalt"));
    }

    #[test]
    fn distinct_tokens_yield_distinct_ids() {
        let a = compute_webhook_id("token-a", b"salt");
        let b = compute_webhook_id("token-b", b"salt");
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_mismatched_claim() {
        let id = compute_webhook_id("abc123", b"testSecretSalt");
        assert!(!verify_webhook_id(&id, "wrong-token", b"testSecretSalt"));
    }
}
