pub mod producer;

pub use producer::KafkaEventProducer;
