use thiserror::Error;

/// Failures turning bytes into facts or facts into bytes.
///
/// Every decoding variant is permanent: retrying the same payload cannot succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FactError {
    #[error("Failed to decode fact: {0}")]
    Decode(String),

    #[error("Failed to encode fact: {0}")]
    Encode(String),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown routing key: {0}")]
    UnknownRoutingKey(String),

    #[error("Fact type {fact_type} does not belong on routing key {routing_key}")]
    KindMismatch {
        routing_key: String,
        fact_type: &'static str,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Exchange name cannot be empty")]
    EmptyExchange,
}
