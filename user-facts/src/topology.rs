use crate::errors::TopologyError;
use crate::fact::FactKind;

pub const DEFAULT_EXCHANGE: &str = "user_events";

/// Maps the user fact exchange onto broker topics.
///
/// Each routing key gets its own durable topic named `{exchange}.{routing_key}`,
/// so every fact kind has an independent queue and consumer.
#[derive(Debug, Clone)]
pub struct Topology {
    exchange: String,
}

impl Topology {
    /// # Errors
    /// Returns `TopologyError::EmptyExchange` if exchange is empty
    ///
    /// # Example
    /// ```
    /// use user_facts::{FactKind, Topology};
    ///
    /// let topology = Topology::new("user_events")?;
    /// assert_eq!(topology.topic_for(FactKind::Created), "user_events.user.created");
    /// # Ok::<(), user_facts::TopologyError>(())
    /// ```
    pub fn new(exchange: &str) -> Result<Self, TopologyError> {
        if exchange.is_empty() {
            return Err(TopologyError::EmptyExchange);
        }

        Ok(Self {
            exchange: String::from(exchange),
        })
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn topic_for(&self, kind: FactKind) -> String {
        format!("{}.{}", self.exchange, kind.routing_key())
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            exchange: String::from(DEFAULT_EXCHANGE),
        }
    }
}
