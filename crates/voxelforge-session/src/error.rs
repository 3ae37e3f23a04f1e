//! Error types for the session layer.

use voxelforge_protocol::CodecError;

/// Why a session ended, or why a request to one failed.
///
/// The actor does not return these to callers — failures inside the
/// actor are logged and turn into disconnection — but every teardown
/// carries one as its reason, and [`PlayerHandle`](crate::PlayerHandle)
/// methods surface [`SessionError::Stopped`] once the actor is gone.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The receive activity hit a decode or read failure. Framing
    /// errors are always fatal: the stream cannot be resynchronised.
    #[error("packet stream failed: {0}")]
    Receive(#[from] CodecError),

    /// The transmit activity failed to write a frame.
    #[error("frame transmit failed: {0}")]
    Transmit(#[from] std::io::Error),

    /// The client broke the protocol (unexpected packet for the current
    /// state, keep-alive id mismatch, pong with no ping outstanding).
    #[error("protocol violation: {0}")]
    Protocol(&'static str),

    /// The client failed to answer a keep-alive ping in time.
    #[error("keep-alive timed out")]
    PingTimeout,

    /// The session actor has already shut down.
    #[error("session stopped")]
    Stopped,
}
