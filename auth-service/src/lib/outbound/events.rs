pub mod consumer;
pub mod dead_letter;

pub use consumer::FactConsumer;
pub use dead_letter::KafkaDeadLetterPublisher;
