//! User lifecycle facts
//!
//! Shared by the service that owns user records and the services that keep a
//! local copy of them:
//! - `UserFact`, the immutable record of a committed change
//! - JSON wire encoding tagged by `fact_type`
//! - Broker topology: one topic per routing key under a common exchange
//! - `ShadowUser`, the projection every consumer folds facts into

pub mod errors;
pub mod fact;
pub mod messages;
pub mod shadow;
pub mod topology;

pub use errors::FactError;
pub use errors::TopologyError;
pub use fact::FactChange;
pub use fact::FactKind;
pub use fact::Standing;
pub use fact::UserFact;
pub use fact::UserId;
pub use shadow::project;
pub use shadow::ApplyOutcome;
pub use shadow::ProjectionError;
pub use shadow::ShadowUser;
pub use shadow::SkipReason;
pub use topology::Topology;
