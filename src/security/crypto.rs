use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use rsa::{Oaep, RsaPublicKey, pkcs8::DecodePublicKey};
use sha2::Sha256;

use crate::domain::error::DomainError;

const NONCE_LEN: usize = 12;

/// AES-256-GCM encrypt `plaintext` under `key`, framed as
/// `nonce (12 bytes) || ciphertext || tag`.
pub fn aes_gcm_encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, DomainError> {
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|error| DomainError::EncryptFail(format!("aes-gcm encrypt failed: {error}")))?;

    let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    framed.extend_from_slice(nonce.as_slice());
    framed.extend_from_slice(&ciphertext);
    Ok(framed)
}

/// Inverse of [`aes_gcm_encrypt`].
pub fn aes_gcm_decrypt(key: &[u8; 32], framed: &[u8]) -> Result<Vec<u8>, DomainError> {
    if framed.len() < NONCE_LEN {
        return Err(DomainError::EncryptFail(
            "ciphertext shorter than nonce".to_owned(),
        ));
    }
    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(key.into());
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|error| DomainError::EncryptFail(format!("aes-gcm decrypt failed: {error}")))
}

/// Parse a PKIX/SPKI DER-encoded RSA public key, matching the original
/// service's `x509.ParsePKIXPublicKey` wire format.
pub fn parse_rsa_public_key_der(der: &[u8]) -> Result<RsaPublicKey, DomainError> {
    RsaPublicKey::from_public_key_der(der)
        .map_err(|error| DomainError::ConfigInvalid(format!("invalid RSA public key: {error}")))
}

/// RSA-OAEP(SHA-256) encrypt `plain_id` under the caster's public key.
///
/// The OAEP hash/MGF/label are pinned to SHA-256 with an empty label — a
/// fixed deployment contract with the downstream caster, not a per-message
/// choice (spec Open Question, resolved in DESIGN.md).
pub fn rsa_encrypt_id(public_key: &RsaPublicKey, plain_id: &str) -> Result<Vec<u8>, DomainError> {
    let padding = Oaep::new::<Sha256>();
    let mut rng = rand::thread_rng();
    public_key
        .encrypt(&mut rng, padding, plain_id.as_bytes())
        .map_err(|error| DomainError::EncryptFail(format!("rsa-oaep encrypt failed: {error}")))
}

#[cfg(test)]
mod tests {
    use super::aes_gcm_decrypt;
    use super::aes_gcm_encrypt;
    use super::rsa_encrypt_id;
    use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
    use sha2::Sha256;

    #[test]
    fn aes_gcm_round_trips() {
        let key = [7u8; 32];
        let plaintext = b"redacted telegram update";
        let framed = aes_gcm_encrypt(&key, plaintext).expect("encrypt");
        let recovered = aes_gcm_decrypt(&key, &framed).expect("decrypt");
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn aes_gcm_rejects_truncated_ciphertext() {
        let key = [7u8; 32];
        assert!(aes_gcm_decrypt(&key, b"short").is_err());
    }

    #[test]
    fn aes_gcm_nonces_are_fresh_per_call() {
        let key = [3u8; 32];
        let a = aes_gcm_encrypt(&key, b"same plaintext").expect("encrypt");
        let b = aes_gcm_encrypt(&key, b"same plaintext").expect("encrypt");
        assert_ne!(a, b, "nonce reuse would make ciphertexts identical");
    }

    #[test]
    fn rsa_oaep_round_trips_with_pinned_sha256_params() {
        let private_key =
            RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("rsa key generation");
        let public_key = RsaPublicKey::from(&private_key);

        let encrypted = rsa_encrypt_id(&public_key, "123456789").expect("encrypt");

        let decrypted = private_key
            .decrypt(Oaep::new::<Sha256>(), &encrypted)
            .expect("decrypt with the same pinned OAEP(SHA-256) params");
        assert_eq!(decrypted, b"123456789");
    }
}
