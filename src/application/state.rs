use std::sync::Arc;

use rsa::RsaPublicKey;

use crate::{
    application::config::RuntimeConfig,
    bus::TopicBus,
    domain::models::PrivacyRule,
    privacy,
};

/// Process-wide immutable state threaded into every request handler and
/// into the registration consumer.
///
/// Everything here is set once at startup and never mutated afterwards —
/// the rewrite's global-state replacement called for in spec.md §9: no
/// package-level mutable variables, just one `Arc<Context>` passed by
/// reference.
pub struct Context {
    pub rules: Vec<PrivacyRule>,
    pub config: RuntimeConfig,
    pub bus: Arc<dyn TopicBus>,
}

impl Context {
    #[must_use]
    pub fn new(config: RuntimeConfig, bus: Arc<dyn TopicBus>) -> Self {
        Self {
            rules: privacy::rules::load_embedded_rules(),
            config,
            bus,
        }
    }

    #[must_use]
    pub fn secret_salt(&self) -> &[u8] {
        &self.config.secret_salt
    }

    #[must_use]
    pub fn payload_key(&self) -> &[u8; 32] {
        &self.config.payload_key
    }

    #[must_use]
    pub fn caster_public_key(&self) -> &RsaPublicKey {
        &self.config.caster_public_key
    }
}

pub type SharedContext = Arc<Context>;
