//! Error types for the protocol layer.
//!
//! Each crate in Voxelforge defines its own error enum. When you see a
//! `CodecError`, you know the problem is in packet framing — not in the
//! session or the world.

/// Errors that can occur while encoding or decoding packets.
///
/// All of these are framing errors: the wire layout of a packet is fixed
/// by its field declarations, so once a decode goes wrong there is no way
/// to resynchronise the stream. Callers must treat every variant as fatal
/// to the connection.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The underlying reader or writer failed (short read, closed
    /// connection, ...). The whole packet is aborted — partial records
    /// are never returned to the caller.
    #[error("i/o failure while framing packet: {0}")]
    Io(#[from] std::io::Error),

    /// A string field carried a negative length prefix.
    #[error("string length prefix is negative: {0}")]
    NegativeStringLength(i16),

    /// A string field does not fit the 2-byte signed length prefix.
    #[error("string too long for wire form: {0} utf-16 units")]
    StringTooLong(usize),

    /// The leading type byte did not match any known packet kind.
    ///
    /// With no length field on the wire there is nothing to skip, so an
    /// unknown id leaves the stream unreadable.
    #[error("unknown packet id {0:#04x}")]
    UnknownPacketId(u8),
}
