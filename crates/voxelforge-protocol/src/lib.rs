//! Wire protocol for the voxelforge server.
//!
//! Three layers, bottom up:
//!
//! - [`codec`] — the [`Wire`] trait: big-endian field encoding over an
//!   async byte stream, one impl per field type.
//! - [`types`] — id newtypes and coordinate types shared across packets
//!   and the rest of the server.
//! - [`packets`] — the packet catalogue and the [`ClientPacket`]
//!   registry that frames and dispatches inbound packets.
//!
//! The protocol is length-implicit: there is no frame header, so the
//! decode path reads straight off the connection and any malformed or
//! unknown packet poisons the stream for good. Sessions treat every
//! [`CodecError`] as fatal to the connection.

#![allow(async_fn_in_trait)]

pub mod codec;
pub mod error;
pub mod packets;
pub mod types;

pub use codec::Wire;
pub use error::CodecError;
pub use packets::{ClientPacket, Packet, encode_packet};
