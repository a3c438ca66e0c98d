use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::StreamExt;
use lapin::{
    Channel, Connection, ConnectionProperties, ExchangeKind,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
        ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
};
use tracing::{info, warn};

use super::{Delivery, EXCHANGE, QUEUE_REGISTRATION, ROUTING_KEY_REGISTRATION, TopicBus};
use crate::domain::error::DomainError;

const CONNECT_RETRIES: u32 = 30;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// `lapin`-backed topic bus, talking to the broker named by `RABBITMQ_URL`.
///
/// One channel is shared for every publish and for the registration
/// consumer, matching the upstream service's single-connection,
/// single-channel topology.
pub struct AmqpBus {
    channel: Channel,
}

impl AmqpBus {
    /// Dial `amqp_url`, retrying up to [`CONNECT_RETRIES`] times with a fixed
    /// [`CONNECT_RETRY_DELAY`] between attempts before giving up.
    pub async fn connect(amqp_url: &str) -> Result<Self, DomainError> {
        let mut last_error = None;
        for attempt in 1..=CONNECT_RETRIES {
            match Connection::connect(amqp_url, ConnectionProperties::default()).await {
                Ok(connection) => {
                    let channel = connection.create_channel().await.map_err(|error| {
                        DomainError::Unavailable(format!("failed to open AMQP channel: {error}"))
                    })?;
                    info!(attempt, "connected to AMQP broker");
                    return Ok(Self { channel });
                }
                Err(error) => {
                    warn!(attempt, %error, "AMQP connection attempt failed, retrying");
                    last_error = Some(error);
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
            }
        }
        Err(DomainError::Unavailable(format!(
            "could not connect to AMQP broker after {CONNECT_RETRIES} attempts: {:?}",
            last_error
        )))
    }
}

#[async_trait]
impl TopicBus for AmqpBus {
    async fn declare_topology(&self) -> Result<(), DomainError> {
        self.channel
            .exchange_declare(
                EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|error| DomainError::Unavailable(format!("exchange_declare failed: {error}")))?;

        let queue = self
            .channel
            .queue_declare(
                QUEUE_REGISTRATION,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|error| DomainError::Unavailable(format!("queue_declare failed: {error}")))?;

        self.channel
            .queue_bind(
                queue.name().as_str(),
                EXCHANGE,
                ROUTING_KEY_REGISTRATION,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|error| DomainError::Unavailable(format!("queue_bind failed: {error}")))?;

        info!(exchange = EXCHANGE, queue = QUEUE_REGISTRATION, "declared AMQP topology");
        Ok(())
    }

    async fn publish(&self, routing_key: &str, body: Vec<u8>) -> Result<(), DomainError> {
        self.channel
            .basic_publish(
                EXCHANGE,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                Default::default(),
            )
            .await
            .map_err(|error| DomainError::BrokerPublishFail(error.to_string()))?
            .await
            .map_err(|error| DomainError::BrokerPublishFail(error.to_string()))?;
        Ok(())
    }

    async fn consume_registrations(
        &self,
        handler: Box<dyn Fn(Delivery) + Send + Sync>,
    ) -> Result<(), DomainError> {
        let mut consumer = self
            .channel
            .basic_consume(
                QUEUE_REGISTRATION,
                "telehook-registration-consumer",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|error| DomainError::Unavailable(format!("basic_consume failed: {error}")))?;

        while let Some(delivery) = consumer.next().await {
            let delivery = match delivery {
                Ok(delivery) => delivery,
                Err(error) => {
                    warn!(%error, "AMQP delivery error, ending consumer loop");
                    break;
                }
            };

            let body = delivery.data.clone();
            let acker = delivery.acker.clone();
            handler(Delivery::new(
                body,
                move |requeue| {
                    tokio::spawn(async move {
                        let result = if requeue {
                            acker.nack(BasicNackOptions {
                                requeue: true,
                                ..Default::default()
                            }).await
                        } else {
                            acker.ack(BasicAckOptions::default()).await
                        };
                        if let Err(error) = result {
                            warn!(%error, "failed to settle AMQP delivery");
                        }
                    });
                },
            ));
        }
        Ok(())
    }
}
