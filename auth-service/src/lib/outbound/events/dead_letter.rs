use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::message::BorrowedMessage;
use rdkafka::message::Header;
use rdkafka::message::OwnedHeaders;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use rdkafka::Message;
use thiserror::Error;

use crate::config::Config;

pub const REASON_HEADER: &str = "x-dead-letter-reason";
pub const ORIGINAL_TOPIC_HEADER: &str = "x-original-topic";
pub const ORIGINAL_PARTITION_HEADER: &str = "x-original-partition";
pub const ORIGINAL_OFFSET_HEADER: &str = "x-original-offset";

#[derive(Debug, Error)]
pub enum DeadLetterError {
    #[error("Failed to forward message to dead letter topic: {0}")]
    SendError(String),
}

/// Forwards rejected user facts to a dead letter topic.
///
/// The original key and body are kept byte for byte; the rejection reason and
/// origin travel as headers.
pub struct KafkaDeadLetterPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaDeadLetterPublisher {
    pub fn new(config: &Config, topic: &str) -> Result<Self, anyhow::Error> {
        tracing::info!(
            brokers = %config.kafka.brokers,
            topic = topic,
            "Initializing dead letter producer"
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka.brokers)
            .set("message.timeout.ms", "30000")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
            timeout: Duration::from_secs(30),
        })
    }

    pub async fn forward(
        &self,
        message: &BorrowedMessage<'_>,
        reason: &str,
    ) -> Result<(), DeadLetterError> {
        let partition = message.partition().to_string();
        let offset = message.offset().to_string();

        let headers = OwnedHeaders::new()
            .insert(Header {
                key: REASON_HEADER,
                value: Some(reason),
            })
            .insert(Header {
                key: ORIGINAL_TOPIC_HEADER,
                value: Some(message.topic()),
            })
            .insert(Header {
                key: ORIGINAL_PARTITION_HEADER,
                value: Some(partition.as_str()),
            })
            .insert(Header {
                key: ORIGINAL_OFFSET_HEADER,
                value: Some(offset.as_str()),
            });

        let mut record: FutureRecord<'_, [u8], [u8]> =
            FutureRecord::to(&self.topic).headers(headers);
        if let Some(key) = message.key() {
            record = record.key(key);
        }
        if let Some(payload) = message.payload() {
            record = record.payload(payload);
        }

        self.producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map(|_| {
                tracing::warn!(
                    topic = %self.topic,
                    original_topic = message.topic(),
                    offset = message.offset(),
                    reason = reason,
                    "User fact dead-lettered"
                );
            })
            .map_err(|(err, _)| DeadLetterError::SendError(err.to_string()))
    }
}
