//! The keep-alive state machine.
//!
//! Two phases and one timer:
//!
//! ```text
//!   Idle ──(interval elapses: send ping, arm timeout)──→ AwaitingPong
//!     ↑                                                      │
//!     └──(matching pong: record latency, arm interval)───────┘
//! ```
//!
//! The timer firing while a pong is outstanding means the client went
//! silent; a pong that does not match the outstanding id (or arrives
//! with none outstanding) is a protocol violation. The actor owns the
//! timer itself — this type only tracks phase, id, and deadline.

use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// Correlation id reserved for client-initiated pings; server pings
/// must never use it.
pub const CLIENT_PING_ID: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingPong { id: i32, sent_at: Instant },
}

/// What to do when the keep-alive deadline fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineAction {
    /// Send a ping carrying this correlation id.
    SendPing(i32),
    /// The outstanding ping was never answered; disconnect.
    TimedOut,
}

/// How an inbound pong was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PongOutcome {
    /// Matched the outstanding ping; round-trip latency attached.
    Latency(Duration),
    /// No ping outstanding, relaxed mode accepted it anyway.
    Ignored,
    /// Wrong correlation id; disconnect.
    MismatchedId { expected: i32, got: i32 },
    /// No ping outstanding and relaxed mode is off; disconnect.
    Unexpected,
}

/// Keep-alive phase tracker for one session.
#[derive(Debug)]
pub struct KeepAliveTracker {
    interval: Duration,
    timeout: Duration,
    relaxed: bool,
    phase: Phase,
    deadline: Instant,
}

impl KeepAliveTracker {
    pub fn new(interval: Duration, timeout: Duration, relaxed: bool) -> Self {
        Self {
            interval,
            timeout,
            relaxed,
            phase: Phase::Idle,
            deadline: Instant::now() + interval,
        }
    }

    /// The instant the actor should wake to advance this state machine.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether a ping is outstanding.
    pub fn awaiting_pong(&self) -> bool {
        matches!(self.phase, Phase::AwaitingPong { .. })
    }

    /// Advances the machine when the deadline fires.
    pub fn on_deadline(&mut self) -> DeadlineAction {
        match self.phase {
            Phase::Idle => {
                let id = fresh_ping_id();
                self.phase = Phase::AwaitingPong {
                    id,
                    sent_at: Instant::now(),
                };
                self.deadline = Instant::now() + self.timeout;
                DeadlineAction::SendPing(id)
            }
            Phase::AwaitingPong { .. } => DeadlineAction::TimedOut,
        }
    }

    /// Classifies an inbound pong and, on a match, re-arms the
    /// inter-ping timer.
    pub fn on_pong(&mut self, id: i32) -> PongOutcome {
        match self.phase {
            Phase::AwaitingPong { id: expected, sent_at } if id == expected => {
                self.phase = Phase::Idle;
                self.deadline = Instant::now() + self.interval;
                PongOutcome::Latency(sent_at.elapsed())
            }
            Phase::AwaitingPong { id: expected, .. } => PongOutcome::MismatchedId {
                expected,
                got: id,
            },
            Phase::Idle if self.relaxed => PongOutcome::Ignored,
            Phase::Idle => PongOutcome::Unexpected,
        }
    }

    /// Whether a measured latency is sane enough to publish: it must be
    /// under the timeout bound (guards against timer glitches around a
    /// suspend/resume).
    pub fn latency_publishable(&self, latency: Duration) -> bool {
        latency < self.timeout
    }
}

/// A random non-zero correlation id. Zero is [`CLIENT_PING_ID`].
fn fresh_ping_id() -> i32 {
    let mut rng = rand::rng();
    loop {
        let id: i32 = rng.random();
        if id != CLIENT_PING_ID {
            return id;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(20);
    const TIMEOUT: Duration = Duration::from_secs(60);

    fn tracker(relaxed: bool) -> KeepAliveTracker {
        KeepAliveTracker::new(INTERVAL, TIMEOUT, relaxed)
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_from_idle_sends_nonzero_ping() {
        let mut ka = tracker(false);
        let DeadlineAction::SendPing(id) = ka.on_deadline() else {
            panic!("idle deadline must send a ping");
        };
        assert_ne!(id, CLIENT_PING_ID);
        assert!(ka.awaiting_pong());
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_pong_yields_latency_and_rearms() {
        let mut ka = tracker(false);
        let DeadlineAction::SendPing(id) = ka.on_deadline() else {
            panic!("idle deadline must send a ping");
        };

        tokio::time::advance(Duration::from_millis(150)).await;
        match ka.on_pong(id) {
            PongOutcome::Latency(latency) => {
                assert_eq!(latency, Duration::from_millis(150));
                assert!(ka.latency_publishable(latency));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert!(!ka.awaiting_pong());
        assert_eq!(ka.deadline(), Instant::now() + INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_while_awaiting_pong_times_out() {
        let mut ka = tracker(false);
        ka.on_deadline();
        assert_eq!(ka.on_deadline(), DeadlineAction::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_pong_is_flagged() {
        let mut ka = tracker(false);
        let DeadlineAction::SendPing(id) = ka.on_deadline() else {
            panic!("idle deadline must send a ping");
        };
        let got = id.wrapping_add(1);
        assert_eq!(
            ka.on_pong(got),
            PongOutcome::MismatchedId { expected: id, got }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsolicited_pong_is_a_violation_by_default() {
        let mut ka = tracker(false);
        assert_eq!(ka.on_pong(42), PongOutcome::Unexpected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relaxed_mode_ignores_unsolicited_pong() {
        let mut ka = tracker(true);
        assert_eq!(ka.on_pong(42), PongOutcome::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_at_timeout_bound_is_not_publishable() {
        let ka = tracker(false);
        assert!(ka.latency_publishable(TIMEOUT - Duration::from_millis(1)));
        assert!(!ka.latency_publishable(TIMEOUT));
    }
}
