use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Delivery, TopicBus};
use crate::domain::error::DomainError;

/// In-process stand-in for the AMQP broker, used by integration tests.
/// Mirrors the shape of a mock bus client: every publish is recorded rather
/// than sent anywhere, and registration deliveries are injected by the test
/// through [`InMemoryBus::inject_registration`].
#[derive(Clone)]
pub struct InMemoryBus {
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    registrations_tx: mpsc::UnboundedSender<Vec<u8>>,
    registrations_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>>,
}

impl InMemoryBus {
    #[must_use]
    pub fn new() -> Self {
        let (registrations_tx, registrations_rx) = mpsc::unbounded_channel();
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            registrations_tx,
            registrations_rx: Arc::new(Mutex::new(Some(registrations_rx))),
        }
    }

    #[must_use]
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().expect("published lock poisoned").clone()
    }

    /// Feed a registration request into the consumer loop, as if the
    /// broker had delivered it.
    pub fn inject_registration(&self, body: Vec<u8>) {
        let _ = self.registrations_tx.send(body);
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicBus for InMemoryBus {
    async fn declare_topology(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn publish(&self, routing_key: &str, body: Vec<u8>) -> Result<(), DomainError> {
        self.published
            .lock()
            .expect("published lock poisoned")
            .push((routing_key.to_owned(), body));
        Ok(())
    }

    async fn consume_registrations(
        &self,
        handler: Box<dyn Fn(Delivery) + Send + Sync>,
    ) -> Result<(), DomainError> {
        let mut rx = self
            .registrations_rx
            .lock()
            .expect("registrations_rx lock poisoned")
            .take()
            .ok_or_else(|| DomainError::Unavailable("consumer already started".to_owned()))?;

        while let Some(body) = rx.recv().await {
            handler(Delivery::new(body, |_requeue| {}));
        }
        Ok(())
    }
}
