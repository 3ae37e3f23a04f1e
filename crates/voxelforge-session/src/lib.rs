//! Per-connection session layer for Voxelforge.
//!
//! Each logged-in connection runs as an isolated actor (see
//! [`player`]): one task owning all session state, fed by channels from
//! the connection's receive/transmit activities, from world
//! collaborators, and from the keep-alive timer.
//!
//! # Key types
//!
//! - [`spawn_player`] — starts the three session tasks for a connection
//! - [`PlayerHandle`] — reach a running session from anywhere
//! - [`SessionCommand`] — the closed set of cross-task operations
//! - [`SessionConfig`] / [`SessionState`] — tunables and lifecycle
//! - [`KeepAliveTracker`] — the ping/pong state machine

#![allow(async_fn_in_trait)]

mod command;
mod config;
mod error;
mod ping;
mod player;

pub use command::{PlayerHandle, SessionCommand};
pub use config::{SessionConfig, SessionState};
pub use error::SessionError;
pub use ping::{CLIENT_PING_ID, DeadlineAction, KeepAliveTracker, PongOutcome};
pub use player::{PlayerProfile, PlayerServices, spawn_player};
