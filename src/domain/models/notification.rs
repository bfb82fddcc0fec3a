use serde::Serialize;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Delivery lifecycle of a queued notification.
///
/// `queued -> delivering -> {delivered | retrying -> delivering | exhausted}`;
/// a stop signal during a retry wait moves the job to `abandoned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Queued,
    Delivering,
    Retrying,
    Delivered,
    Exhausted,
    Abandoned,
}

impl DeliveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryState::Delivered | DeliveryState::Exhausted | DeliveryState::Abandoned)
    }

    pub fn can_transition_to(&self, next: DeliveryState) -> bool {
        use DeliveryState::*;
        matches!(
            (self, next),
            (Queued, Delivering)
                | (Delivering, Delivered)
                | (Delivering, Retrying)
                | (Delivering, Exhausted)
                | (Retrying, Delivering)
                | (Retrying, Abandoned)
        )
    }
}

/// Queue-resident message; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationJob {
    pub id: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub enqueued_at: DateTime<Utc>,
    pub attempts: u32,
    pub state: DeliveryState,
}

impl NotificationJob {
    pub fn new(recipient: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            enqueued_at: Utc::now(),
            attempts: 0,
            state: DeliveryState::Queued,
        }
    }

    /// Returns false (and leaves the state untouched) for an illegal move.
    pub fn advance(&mut self, next: DeliveryState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_and_retry_cycle() {
        let mut job = NotificationJob::new("a@b.c", "s", "b");
        assert!(job.advance(DeliveryState::Delivering));
        assert!(job.advance(DeliveryState::Retrying));
        assert!(job.advance(DeliveryState::Delivering));
        assert!(job.advance(DeliveryState::Delivered));
        assert!(job.state.is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [DeliveryState::Delivered, DeliveryState::Exhausted, DeliveryState::Abandoned] {
            for next in [DeliveryState::Queued, DeliveryState::Delivering, DeliveryState::Retrying, DeliveryState::Delivered] {
                assert!(!terminal.can_transition_to(next));
            }
        }

        let mut job = NotificationJob::new("a@b.c", "s", "b");
        assert!(!job.advance(DeliveryState::Delivered));
        assert_eq!(job.state, DeliveryState::Queued);
    }
}
