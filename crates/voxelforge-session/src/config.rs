//! Session configuration and the connection lifecycle state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for session behavior.
///
/// One copy per server; sessions take a clone at spawn. Serializable so
/// deployments can carry it inside their server configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds between keep-alive pings while the client is responsive.
    ///
    /// Default: 20.
    pub ping_interval_secs: u64,

    /// Seconds a client has to answer a ping before it is dropped.
    ///
    /// Default: 60.
    pub ping_timeout_secs: u64,

    /// Accept a pong while no ping is outstanding instead of treating
    /// it as a protocol violation.
    ///
    /// Compatibility affordance for replayed/recorded sessions, where
    /// pongs arrive on the recording's schedule rather than ours.
    /// Default: off — an unsolicited pong disconnects.
    pub relaxed_keepalive: bool,

    /// Maximum distance (blocks) a single movement packet may travel
    /// from the last known position before it is discarded.
    ///
    /// Default: 10.0.
    pub max_move_distance: f64,

    /// Maximum distance (blocks) at which block hits and interactions
    /// are honoured.
    ///
    /// Default: 6.0.
    pub max_interact_distance: f64,

    /// Capacity of the inbound-packet and outbound-frame queues.
    ///
    /// Default: 128.
    pub queue_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: 20,
            ping_timeout_secs: 60,
            relaxed_keepalive: false,
            max_move_distance: 10.0,
            max_interact_distance: 6.0,
            queue_depth: 128,
        }
    }
}

impl SessionConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }
}

/// The connection lifecycle.
///
/// ```text
///   LoggingIn ──(spawn chunk ready)──→ Active
///       │                                │
///       └────────→ Disconnecting ←───────┘
///                        │ (teardown complete)
///                        ▼
///                     Closed
/// ```
///
/// Any state moves to `Disconnecting` on a stop request, a protocol
/// violation, an I/O failure, or a ping timeout. The pre-login
/// `Connecting` phase belongs to the server's handshake code; a session
/// only exists once login succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Logged in, waiting for the spawn chunk to be confirmed loaded.
    /// Movement packets are discarded in this state.
    LoggingIn,
    /// Fully in the world.
    Active,
    /// Teardown in progress.
    Disconnecting,
    /// Connection closed, departure announced. Terminal.
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::LoggingIn => "logging_in",
            SessionState::Active => "active",
            SessionState::Disconnecting => "disconnecting",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
