use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use thiserror::Error;
use user_facts::messages;
use user_facts::Topology;
use user_facts::UserFact;

use crate::config::Config;
use crate::user::errors::EventPublisherError;
use crate::user::ports::EventPublisher;

#[derive(Debug, Error)]
pub enum KafkaProducerError {
    #[error("Failed to send message to Kafka: {0}")]
    SendError(String),

    #[error("Failed to serialize message: {0}")]
    SerializationError(String),
}

impl From<KafkaProducerError> for EventPublisherError {
    fn from(err: KafkaProducerError) -> Self {
        match err {
            KafkaProducerError::SerializationError(msg) => {
                EventPublisherError::SerializationFailed(msg)
            }
            KafkaProducerError::SendError(msg) => EventPublisherError::PublishFailed(msg),
        }
    }
}

/// Publishes user facts to the topic of their routing key.
pub struct KafkaEventProducer {
    producer: FutureProducer,
    topology: Topology,
    timeout: Duration,
}

impl KafkaEventProducer {
    /// Create a new Kafka event producer with "at least once" delivery semantics
    ///
    /// # Arguments
    /// * `config` - Application configuration
    ///
    /// # Notes:
    /// - `acks=all`: Wait for all in-sync replicas to acknowledge
    /// - `enable.idempotence=true`: Prevents duplicate messages during retries
    /// - `max.in.flight.requests.per.connection=5`: Allows pipelining with ordering guarantees
    /// - `retry.backoff.ms=100`: Backoff between retry attempts
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let topology = Topology::new(&config.kafka.exchange)?;

        tracing::info!(
            brokers = %config.kafka.brokers,
            exchange = %topology.exchange(),
            "Initializing Kafka producer for user facts"
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka.brokers)
            .set("message.timeout.ms", "30000")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("max.in.flight.requests.per.connection", "5")
            .set("retry.backoff.ms", "100")
            .create()?;

        Ok(Self {
            producer,
            topology,
            timeout: Duration::from_secs(30),
        })
    }

    async fn send(&self, topic: &str, user_id: &str, payload: &[u8]) -> Result<(), KafkaProducerError> {
        let record = FutureRecord::to(topic)
            .key(user_id) // Partition by user_id for per-user ordering
            .payload(payload);

        self.producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map(|_| {
                tracing::debug!(topic = topic, user_id = user_id, "User fact published");
            })
            .map_err(|(err, _)| KafkaProducerError::SendError(err.to_string()))
    }
}

#[async_trait]
impl EventPublisher for KafkaEventProducer {
    async fn publish(&self, fact: &UserFact) -> Result<(), EventPublisherError> {
        let payload = messages::encode(fact)
            .map_err(|e| KafkaProducerError::SerializationError(e.to_string()))?;
        let topic = self.topology.topic_for(fact.kind());
        let user_id = fact.user_id.to_string();

        self.send(&topic, &user_id, &payload).await.map_err(|e| {
            tracing::error!(
                topic = %topic,
                user_id = %user_id,
                "Failed to publish user fact after all retries: {}",
                e
            );
            e.into()
        })
    }
}
