mod amqp;
mod memory;
pub mod wire;

pub use amqp::AmqpBus;
pub use memory::InMemoryBus;

use async_trait::async_trait;

use crate::domain::error::DomainError;

pub const EXCHANGE: &str = "murmapp";
pub const ROUTING_KEY_MESSAGES_IN: &str = "telegram.messages.in";
pub const ROUTING_KEY_ENCRYPTED_ID: &str = "telegram.encrypted.id";
pub const ROUTING_KEY_REGISTRATION: &str = "webhook.registration";
pub const ROUTING_KEY_REGISTERED: &str = "webhook.registered";
pub const QUEUE_REGISTRATION: &str = "murmapp.hook.webhook.registration";

/// A delivered message handed to a registration consumer.
pub struct Delivery {
    pub body: Vec<u8>,
    ack: Box<dyn FnOnce(bool) + Send>,
}

impl Delivery {
    #[must_use]
    pub fn new(body: Vec<u8>, ack: impl FnOnce(bool) + Send + 'static) -> Self {
        Self {
            body,
            ack: Box::new(ack),
        }
    }

    /// Acknowledge the delivery. `requeue = true` asks the broker to redeliver.
    pub fn settle(self, requeue: bool) {
        (self.ack)(requeue);
    }
}

/// Abstraction over the topic message bus, so the HTTP ingress and the
/// registration consumer don't depend on a concrete broker client.
///
/// One `murmapp` topic exchange carries every routing key this service
/// publishes or consumes; see the constants above.
#[async_trait]
pub trait TopicBus: Send + Sync {
    /// Idempotently declare the `murmapp` topic exchange and the
    /// registration queue bound to it. Called once at startup.
    async fn declare_topology(&self) -> Result<(), DomainError>;

    async fn publish(&self, routing_key: &str, body: Vec<u8>) -> Result<(), DomainError>;

    /// Start consuming `QUEUE_REGISTRATION`, handing each delivery to
    /// `handler`. Returns once the consumer stream ends (connection lost or
    /// shutdown).
    async fn consume_registrations(
        &self,
        handler: Box<dyn Fn(Delivery) + Send + Sync>,
    ) -> Result<(), DomainError>;
}
