//! Unified error type for the Voxelforge server.

use voxelforge_protocol::CodecError;
use voxelforge_session::SessionError;

/// Top-level error wrapping the crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum VoxelforgeError {
    /// A wire-protocol error (framing, decode, encode).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A session-level error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An I/O error outside any session (binding, accepting, the
    /// handshake exchange).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The client broke the handshake/login sequence.
    #[error("handshake failed: {0}")]
    Handshake(&'static str),
}
