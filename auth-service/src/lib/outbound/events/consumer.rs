use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use rdkafka::consumer::CommitMode;
use rdkafka::consumer::Consumer;
use rdkafka::consumer::StreamConsumer;
use rdkafka::message::BorrowedMessage;
use rdkafka::ClientConfig;
use rdkafka::Message;
use rdkafka::Offset;
use tokio::sync::watch;
use user_facts::FactKind;
use user_facts::Topology;

use super::dead_letter::DeadLetterError;
use super::dead_letter::KafkaDeadLetterPublisher;
use crate::config::Config;
use crate::domain::shadow::models::Disposition;
use crate::domain::shadow::models::MessageOutcome;
use crate::domain::shadow::ports::ShadowUserRepository;
use crate::domain::shadow::reconciler::Reconciler;

/// Broker actions available while settling one delivered message.
#[async_trait]
pub trait Settlement {
    /// Commit the offset past the message.
    fn commit(&self);

    /// Hand the message to the dead letter topic, or drop it when none is configured.
    async fn dead_letter(&self, reason: &str) -> Result<(), DeadLetterError>;

    /// Wait out the requeue backoff, then rewind so the message is delivered again.
    async fn rewind(&self);
}

/// Carry out what `outcome` asks of the broker.
///
/// A rejected message whose dead-lettering fails is rewound instead of
/// committed, so it is never lost.
pub async fn settle<S>(delivery: &S, outcome: &MessageOutcome)
where
    S: Settlement + Sync,
{
    match outcome.disposition() {
        Disposition::Ack => delivery.commit(),
        Disposition::Reject { requeue: false } => {
            match delivery.dead_letter(&outcome.reason()).await {
                Ok(()) => delivery.commit(),
                Err(error) => {
                    tracing::error!(reason = %outcome.reason(), "{}", error);
                    delivery.rewind().await;
                }
            }
        }
        Disposition::Reject { requeue: true } => delivery.rewind().await,
    }
}

/// Kafka consumer for one routing key of the user fact exchange.
///
/// Offsets are committed by hand, one message at a time:
/// - acknowledge: commit past the message
/// - reject without requeue: dead-letter (when configured), then commit
/// - reject with requeue: wait, then seek back so the message is delivered again
pub struct FactConsumer<R: ShadowUserRepository> {
    consumer: StreamConsumer,
    topic: String,
    routing_key: &'static str,
    reconciler: Arc<Reconciler<R>>,
    dead_letters: Option<Arc<KafkaDeadLetterPublisher>>,
    requeue_backoff: Duration,
}

impl<R: ShadowUserRepository> FactConsumer<R> {
    /// Create a consumer bound to the topic of `kind`.
    ///
    /// # Arguments
    /// * `config` - Application configuration
    /// * `topology` - Exchange to topic mapping
    /// * `kind` - Fact kind whose routing key this consumer serves
    /// * `reconciler` - Applies decoded facts to the shadow store
    /// * `dead_letters` - Destination for rejected messages, if any
    pub fn new(
        config: &Config,
        topology: &Topology,
        kind: FactKind,
        reconciler: Arc<Reconciler<R>>,
        dead_letters: Option<Arc<KafkaDeadLetterPublisher>>,
    ) -> Result<Self, anyhow::Error> {
        let routing_key = kind.routing_key();
        let topic = topology.topic_for(kind);
        let group_id = config.kafka.group_for(routing_key);

        tracing::info!(
            brokers = %config.kafka.brokers,
            group_id = %group_id,
            topic = %topic,
            "Initializing user fact consumer"
        );

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka.brokers)
            .set("group.id", &group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest") // Replay every fact the group has not acknowledged
            .set("session.timeout.ms", "30000")
            .set("enable.partition.eof", "false")
            .create()?;

        consumer.subscribe(&[topic.as_str()])?;

        Ok(Self {
            consumer,
            topic,
            routing_key,
            reconciler,
            dead_letters,
            requeue_backoff: config.kafka.requeue_backoff(),
        })
    }

    /// Consume until `shutdown` turns true or its sender is dropped.
    ///
    /// A message being handled when shutdown is signalled is finished and
    /// settled before the loop exits.
    pub async fn start_consuming(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(topic = %self.topic, "Starting user fact consumer loop");

        let mut message_stream = self.consumer.stream();

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                next = message_stream.next() => match next {
                    Some(Ok(message)) => self.process(&message).await,
                    Some(Err(error)) => {
                        tracing::error!(topic = %self.topic, "Kafka consumer error: {}", error);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                    None => break,
                },
            }
        }

        drop(message_stream);

        if let Err(error) = self.consumer.commit_consumer_state(CommitMode::Sync) {
            tracing::debug!(topic = %self.topic, "Final offset commit skipped: {}", error);
        }

        tracing::info!(topic = %self.topic, "User fact consumer stopped");
    }

    async fn process(&self, message: &BorrowedMessage<'_>) {
        let outcome = self
            .reconciler
            .handle(self.routing_key, message.payload())
            .await;

        settle(&KafkaDelivery { owner: self, message }, &outcome).await;
    }
}

/// A message in flight on a [`FactConsumer`].
struct KafkaDelivery<'a, R: ShadowUserRepository> {
    owner: &'a FactConsumer<R>,
    message: &'a BorrowedMessage<'a>,
}

#[async_trait]
impl<R: ShadowUserRepository> Settlement for KafkaDelivery<'_, R> {
    fn commit(&self) {
        let message = self.message;
        if let Err(error) = self
            .owner
            .consumer
            .commit_message(message, CommitMode::Async)
        {
            // The message will be redelivered and skipped as a duplicate.
            tracing::warn!(
                topic = %self.owner.topic,
                offset = message.offset(),
                "Failed to commit offset: {}",
                error
            );
        }
    }

    async fn dead_letter(&self, reason: &str) -> Result<(), DeadLetterError> {
        match &self.owner.dead_letters {
            Some(dead_letters) => dead_letters.forward(self.message, reason).await,
            None => {
                tracing::warn!(
                    topic = %self.owner.topic,
                    offset = self.message.offset(),
                    reason = reason,
                    "Dropping rejected user fact"
                );
                Ok(())
            }
        }
    }

    async fn rewind(&self) {
        tokio::time::sleep(self.owner.requeue_backoff).await;

        let message = self.message;
        if let Err(error) = self.owner.consumer.seek(
            message.topic(),
            message.partition(),
            Offset::Offset(message.offset()),
            Duration::from_secs(5),
        ) {
            tracing::error!(
                topic = %self.owner.topic,
                partition = message.partition(),
                offset = message.offset(),
                "Failed to rewind for redelivery: {}",
                error
            );
        }
    }
}
