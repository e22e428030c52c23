use user_facts::FactError;
use user_facts::FactKind;
use user_facts::SkipReason;
use user_facts::UserId;

/// What the broker should do with a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    /// Reject; with `requeue` the broker delivers the message again later.
    Reject { requeue: bool },
}

/// Result of handling one delivered fact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Applied { user_id: UserId, kind: FactKind },
    Skipped { user_id: UserId, reason: SkipReason },
    /// The payload can never be applied.
    ParseFailed(FactError),
    /// A non-`Created` fact for a user with no record.
    UnknownUser(UserId),
    /// The stored record cannot absorb the fact; redelivery meets the same row.
    Corrupt(String),
    /// Storage failed; the fact may apply on redelivery.
    ApplyFailed(String),
    /// Storage did not answer within the apply timeout.
    TimedOut,
}

impl MessageOutcome {
    /// Duplicates and stale facts are acknowledged, which is what makes
    /// at-least-once delivery safe.
    pub fn disposition(&self) -> Disposition {
        match self {
            MessageOutcome::Applied { .. } | MessageOutcome::Skipped { .. } => Disposition::Ack,
            MessageOutcome::ParseFailed(_)
            | MessageOutcome::UnknownUser(_)
            | MessageOutcome::Corrupt(_) => Disposition::Reject { requeue: false },
            MessageOutcome::ApplyFailed(_) | MessageOutcome::TimedOut => {
                Disposition::Reject { requeue: true }
            }
        }
    }

    /// Short description attached to dead-lettered messages.
    pub fn reason(&self) -> String {
        match self {
            MessageOutcome::Applied { .. } => "applied".to_string(),
            MessageOutcome::Skipped { reason, .. } => format!("skipped: {:?}", reason),
            MessageOutcome::ParseFailed(e) => format!("parse failed: {}", e),
            MessageOutcome::UnknownUser(id) => format!("unknown user: {}", id),
            MessageOutcome::Corrupt(e) => format!("corrupt record: {}", e),
            MessageOutcome::ApplyFailed(e) => format!("apply failed: {}", e),
            MessageOutcome::TimedOut => "apply timed out".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispositions() {
        let id = UserId::new();

        assert_eq!(
            MessageOutcome::Applied {
                user_id: id,
                kind: FactKind::Created
            }
            .disposition(),
            Disposition::Ack
        );
        assert_eq!(
            MessageOutcome::Skipped {
                user_id: id,
                reason: SkipReason::Stale
            }
            .disposition(),
            Disposition::Ack
        );
        assert_eq!(
            MessageOutcome::ParseFailed(FactError::MissingField("email")).disposition(),
            Disposition::Reject { requeue: false }
        );
        assert_eq!(
            MessageOutcome::UnknownUser(id).disposition(),
            Disposition::Reject { requeue: false }
        );
        assert_eq!(
            MessageOutcome::Corrupt("role column holds 'wizard'".to_string()).disposition(),
            Disposition::Reject { requeue: false }
        );
        assert_eq!(
            MessageOutcome::ApplyFailed("connection reset".to_string()).disposition(),
            Disposition::Reject { requeue: true }
        );
        assert_eq!(
            MessageOutcome::TimedOut.disposition(),
            Disposition::Reject { requeue: true }
        );
    }
}
