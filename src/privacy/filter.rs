use std::collections::HashSet;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::{
    error::DomainError,
    models::{FilterResult, PrivacyRule, TelegramIdentity},
};

const REDACTED_PLACEHOLDER: &str = "[redacted]";

/// Walk `raw_bytes` as a JSON object, applying every rule in `rules` in
/// order: narrative terminals are replaced with `[redacted]`, identifier
/// (`id`) terminals are pseudonymized and surfaced in the returned identity
/// list.
///
/// Fails with `InvalidJson` if the root isn't a JSON object, or `NoMatch` if
/// zero rules reached a terminal value.
pub fn filter_payload(
    raw_bytes: &[u8],
    rules: &[PrivacyRule],
    secret_salt: &[u8],
) -> Result<FilterResult, DomainError> {
    let mut root: Value = serde_json::from_slice(raw_bytes)
        .map_err(|error| DomainError::InvalidJson(error.to_string()))?;
    if !root.is_object() {
        return Err(DomainError::InvalidJson(
            "root value is not a JSON object".to_owned(),
        ));
    }

    let mut matched = 0usize;
    let mut seen_xids = HashSet::new();
    let mut telegram_ids = Vec::new();

    for rule in rules {
        if let Some(identity) = apply_rule(&mut root, rule, secret_salt) {
            matched += 1;
            if let Some(identity) = identity
                && seen_xids.insert(identity.telegram_xid.clone())
            {
                telegram_ids.push(identity);
            }
        }
    }

    if matched == 0 {
        return Err(DomainError::NoMatch);
    }

    let redacted_json =
        serde_json::to_vec(&root).map_err(|error| DomainError::InvalidJson(error.to_string()))?;

    Ok(FilterResult {
        redacted_json,
        matched,
        telegram_ids,
    })
}

/// Walk one rule over `root`. Returns `None` if the rule did not match
/// (missing path segment, wrong type, or the channel exemption applies).
/// Returns `Some(None)` for a matched narrative redaction and
/// `Some(Some(identity))` for a matched identifier pseudonymization —
/// collapsed here to `Option<Option<TelegramIdentity>>` would be awkward,
/// so callers read "matched" from whether this returns `Some`.
fn apply_rule(
    root: &mut Value,
    rule: &PrivacyRule,
    secret_salt: &[u8],
) -> Option<Option<TelegramIdentity>> {
    let (parents, terminal) = rule.segments.split_at(rule.segments.len().saturating_sub(1));
    let terminal = terminal.first()?;

    let mut current = root;
    for segment in parents {
        let object = current.as_object_mut()?;
        current = object.get_mut(segment.as_str())?;
    }

    let object = current.as_object_mut()?;
    if !object.contains_key(terminal.as_str()) {
        return None;
    }

    if terminal == "id" {
        let plain_id = coerce_id(&object[terminal.as_str()])?;
        let telegram_xid = pseudonymize(&plain_id, secret_salt);
        object.insert(
            terminal.clone(),
            Value::String(telegram_xid.clone()),
        );
        return Some(Some(TelegramIdentity {
            telegram_xid,
            plain_id,
        }));
    }

    if is_channel(object) && (terminal == "title" || terminal == "username") {
        return None;
    }

    object.insert(terminal.clone(), Value::String(REDACTED_PLACEHOLDER.to_owned()));
    Some(None)
}

/// Coerce a JSON `id` leaf to its decimal string form. Numbers format
/// without a fractional part; non-integral floats and any other type are
/// not valid ids and cause the rule to be skipped.
fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 {
                    Some(format!("{f:.0}"))
                } else {
                    None
                }
            }
        }
        _ => None,
    }
}

fn pseudonymize(plain_id: &str, secret_salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain_id.as_bytes());
    hasher.update(secret_salt);
    hex::encode(hasher.finalize())
}

fn is_channel(object: &serde_json::Map<String, Value>) -> bool {
    object.get("type").and_then(Value::as_str) == Some("channel")
}

#[cfg(test)]
mod tests {
    use super::filter_payload;
    use crate::domain::error::DomainError;
    use crate::privacy::rules::load_embedded_rules;
    use serde_json::Value;

    const SALT: &[u8] = b"testSecretSalt";

    #[test]
    fn full_match_numeric_id_pseudonymizes_and_redacts() {
        let raw = br#"{"message":{"from":{"id":123,"first_name":"Eugene","username":"anonymous"},"chat":{"id":123}}}"#;
        let result = filter_payload(raw, &load_embedded_rules(), SALT).expect("filter should match");
        let redacted: Value = serde_json::from_slice(&result.redacted_json).unwrap();

        assert_eq!(
            redacted["message"]["from"]["first_name"],
            Value::String("[redacted]".to_owned())
        );
        assert_eq!(
            redacted["message"]["from"]["username"],
            Value::String("[redacted]".to_owned())
        );
        let expected_xid = "3155b66fa12f59c373773dd79658f85d93baa739fb1025dd67641ce1d4042a21";
        assert_eq!(
            redacted["message"]["from"]["id"],
            Value::String(expected_xid.to_owned())
        );
        assert_eq!(redacted["message"]["from"]["id"], redacted["message"]["chat"]["id"]);
        assert_eq!(result.telegram_ids.len(), 1, "dedup across both id fields");
    }

    #[test]
    fn string_id_is_pseudonymized() {
        let raw = br#"{"message":{"forward_origin":{"sender_user":{"id":"321"}}}}"#;
        let result = filter_payload(raw, &load_embedded_rules(), SALT).expect("filter should match");
        let redacted: Value = serde_json::from_slice(&result.redacted_json).unwrap();
        let xid = redacted["message"]["forward_origin"]["sender_user"]["id"]
            .as_str()
            .unwrap();
        assert_eq!(xid.len(), 64);
        assert_eq!(result.telegram_ids[0].plain_id, "321");
    }

    #[test]
    fn channel_metadata_is_preserved() {
        let raw = br#"{"message":{"forward_from_chat":{"id":-1001234567890,"title":"MyChannel","username":"my_channel","type":"channel"}}}"#;
        let result = filter_payload(raw, &load_embedded_rules(), SALT).expect("filter should match");
        let redacted: Value = serde_json::from_slice(&result.redacted_json).unwrap();

        assert_eq!(
            redacted["message"]["forward_from_chat"]["title"],
            Value::String("MyChannel".to_owned())
        );
        assert_eq!(
            redacted["message"]["forward_from_chat"]["username"],
            Value::String("my_channel".to_owned())
        );
        assert_ne!(
            redacted["message"]["forward_from_chat"]["id"],
            Value::Number((-1001234567890i64).into())
        );
    }

    #[test]
    fn no_match_fails_with_no_match() {
        let raw = br#"{"message":{"from":{"uuid":123}}}"#;
        let error = filter_payload(raw, &load_embedded_rules(), SALT).unwrap_err();
        assert!(matches!(error, DomainError::NoMatch));
    }

    #[test]
    fn invalid_json_fails_with_invalid_json() {
        let raw = b"{ not json }";
        let error = filter_payload(raw, &load_embedded_rules(), SALT).unwrap_err();
        assert!(matches!(error, DomainError::InvalidJson(_)));
    }

    #[test]
    fn pseudonymization_is_deterministic_for_fixed_salt() {
        let raw = br#"{"message":{"from":{"id":42},"chat":{"id":42}}}"#;
        let result = filter_payload(raw, &load_embedded_rules(), SALT).expect("filter should match");
        assert_eq!(result.telegram_ids.len(), 1);
    }
}
