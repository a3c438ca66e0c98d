use serde::{Serialize, de::DeserializeOwned};

use crate::domain::error::DomainError;

/// Binary-encode a wire struct for publication on the bus.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, DomainError> {
    bincode::serialize(value)
        .map_err(|error| DomainError::BrokerPublishFail(format!("encode failed: {error}")))
}

/// Decode a wire struct received from the bus.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
    bincode::deserialize(bytes)
        .map_err(|error| DomainError::InvalidJson(format!("decode failed: {error}")))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};
    use crate::domain::models::EncryptedTelegramId;

    #[test]
    fn round_trips_a_wire_struct() {
        let original = EncryptedTelegramId {
            telegram_xid: "abc".to_owned(),
            encrypted_id: vec![1, 2, 3, 4],
        };
        let bytes = encode(&original).expect("encode");
        let decoded: EncryptedTelegramId = decode(&bytes).expect("decode");
        assert_eq!(decoded.telegram_xid, original.telegram_xid);
        assert_eq!(decoded.encrypted_id, original.encrypted_id);
    }
}
