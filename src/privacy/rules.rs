use crate::domain::models::PrivacyRule;

const EMBEDDED_PRIVACY_KEYS: &str = include_str!("privacy_keys.conf");

/// Parse the embedded `privacy_keys.conf` resource: one rule per
/// non-empty, non-`#`-commented line, in file order. Duplicate rules are
/// kept (the filter applies them idempotently) rather than rejected here.
#[must_use]
pub fn load_embedded_rules() -> Vec<PrivacyRule> {
    parse_rules(EMBEDDED_PRIVACY_KEYS)
}

#[must_use]
pub fn parse_rules(source: &str) -> Vec<PrivacyRule> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PrivacyRule::parse)
        .collect()
}
