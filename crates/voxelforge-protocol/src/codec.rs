//! Field-level wire codec: big-endian values over a byte stream.
//!
//! Every packet in the protocol is a plain record whose wire form is the
//! concatenation of its fields' fixed-width big-endian encodings, in
//! declaration order. Rather than hand-writing an encode/decode pair for
//! each of the dozens of packet shapes, the [`Wire`] trait is implemented
//! once per *field type*, and the [`wire_struct!`] macro derives the
//! record-level codec by walking the declared fields.
//!
//! Field declaration order is therefore part of the external contract.
//! Reordering fields is a breaking protocol change.
//!
//! Decoding is `async` because the protocol is length-implicit: the only
//! way to know where a packet ends is to decode it straight off the
//! connection. Encoding writes into an in-memory frame buffer and is
//! synchronous; only strings can fail to encode.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::CodecError;

/// A value with a fixed, self-describing wire form.
///
/// Implemented for the primitive field kinds (integers, floats, `bool`,
/// `String`), for the id newtypes in [`types`](crate::types), and — via
/// [`wire_struct!`] — for composite records, which recurse through their
/// fields.
///
/// One decoder per connection: `read` takes the reader by `&mut` and is
/// not meant to be shared between tasks.
pub trait Wire: Sized {
    /// Decodes one value, consuming exactly its wire width.
    ///
    /// # Errors
    /// Any I/O failure propagates unchanged and aborts the whole packet.
    async fn read<R>(reader: &mut R) -> Result<Self, CodecError>
    where
        R: AsyncRead + Unpin + Send;

    /// Encodes this value onto the end of a frame buffer.
    ///
    /// # Errors
    /// Returns [`CodecError::StringTooLong`] for strings exceeding the
    /// 2-byte length prefix; all other field kinds are infallible.
    fn write(&self, out: &mut Vec<u8>) -> Result<(), CodecError>;
}

// ---------------------------------------------------------------------------
// Integer and float primitives
// ---------------------------------------------------------------------------

/// Implements [`Wire`] for a primitive with `to_be_bytes`/`from_be_bytes`.
macro_rules! wire_primitive {
    ($($ty:ty => $width:literal),* $(,)?) => {
        $(
            impl Wire for $ty {
                async fn read<R>(reader: &mut R) -> Result<Self, CodecError>
                where
                    R: AsyncRead + Unpin + Send,
                {
                    let mut buf = [0u8; $width];
                    reader.read_exact(&mut buf).await?;
                    Ok(<$ty>::from_be_bytes(buf))
                }

                fn write(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
                    out.extend_from_slice(&self.to_be_bytes());
                    Ok(())
                }
            }
        )*
    };
}

wire_primitive! {
    u8 => 1, i8 => 1,
    u16 => 2, i16 => 2,
    u32 => 4, i32 => 4,
    u64 => 8, i64 => 8,
}

// Floats go through their bit pattern so that NaN payloads and infinities
// survive a round trip exactly.

impl Wire for f32 {
    async fn read<R>(reader: &mut R) -> Result<Self, CodecError>
    where
        R: AsyncRead + Unpin + Send,
    {
        Ok(f32::from_bits(u32::read(reader).await?))
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        self.to_bits().write(out)
    }
}

impl Wire for f64 {
    async fn read<R>(reader: &mut R) -> Result<Self, CodecError>
    where
        R: AsyncRead + Unpin + Send,
    {
        Ok(f64::from_bits(u64::read(reader).await?))
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        self.to_bits().write(out)
    }
}

// ---------------------------------------------------------------------------
// bool
// ---------------------------------------------------------------------------

impl Wire for bool {
    /// Any non-zero byte decodes as `true`.
    async fn read<R>(reader: &mut R) -> Result<Self, CodecError>
    where
        R: AsyncRead + Unpin + Send,
    {
        Ok(u8::read(reader).await? != 0)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.push(u8::from(*self));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// String
// ---------------------------------------------------------------------------

impl Wire for String {
    /// Wire form: a 2-byte signed length prefix counting UTF-16 code
    /// units, followed by that many big-endian code units. Unpaired
    /// surrogates decode to the replacement character.
    async fn read<R>(reader: &mut R) -> Result<Self, CodecError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let len = i16::read(reader).await?;
        if len < 0 {
            return Err(CodecError::NegativeStringLength(len));
        }
        let mut units = Vec::with_capacity(len as usize);
        for _ in 0..len {
            units.push(u16::read(reader).await?);
        }
        Ok(String::from_utf16_lossy(&units))
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let units: Vec<u16> = self.encode_utf16().collect();
        if units.len() > i16::MAX as usize {
            return Err(CodecError::StringTooLong(units.len()));
        }
        (units.len() as i16).write(out)?;
        for unit in units {
            unit.write(out)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Derivation macros
// ---------------------------------------------------------------------------

/// Defines a composite record and derives its [`Wire`] impl by walking
/// the fields in declaration order. Nested composites recurse.
///
/// ```ignore
/// wire_struct! {
///     /// A block position on the wire.
///     pub struct BlockXyz {
///         pub x: i32,
///         pub y: i8,
///         pub z: i32,
///     }
/// }
/// ```
macro_rules! wire_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::Wire for $name {
            // Underscore-named so fieldless records expand without warnings.
            async fn read<R>(_reader: &mut R) -> Result<Self, $crate::CodecError>
            where
                R: tokio::io::AsyncRead + Unpin + Send,
            {
                Ok(Self {
                    $($field: <$ty as $crate::Wire>::read(_reader).await?,)*
                })
            }

            fn write(&self, _out: &mut Vec<u8>) -> Result<(), $crate::CodecError> {
                $($crate::Wire::write(&self.$field, _out)?;)*
                Ok(())
            }
        }
    };
}

/// Derives [`Wire`] for a newtype over `$inner` by delegating to the
/// inner value, e.g. `wire_newtype!(EntityId: i32)`.
macro_rules! wire_newtype {
    ($($name:ident : $inner:ty),* $(,)?) => {
        $(
            impl $crate::Wire for $name {
                async fn read<R>(reader: &mut R) -> Result<Self, $crate::CodecError>
                where
                    R: tokio::io::AsyncRead + Unpin + Send,
                {
                    Ok(Self(<$inner as $crate::Wire>::read(reader).await?))
                }

                fn write(&self, out: &mut Vec<u8>) -> Result<(), $crate::CodecError> {
                    $crate::Wire::write(&self.0, out)
                }
            }
        )*
    };
}

pub(crate) use {wire_newtype, wire_struct};

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the primitive field codecs.
    //!
    //! The round-trip law — encode then decode reproduces the original
    //! value exactly — is the core contract of the codec, including at
    //! the awkward boundaries: extreme integers, non-finite floats,
    //! empty strings.

    use super::*;

    /// Encodes a value and decodes it back.
    async fn round_trip<T: Wire>(value: &T) -> T {
        let mut buf = Vec::new();
        value.write(&mut buf).expect("encode should succeed");
        let mut reader = buf.as_slice();
        let decoded = T::read(&mut reader).await.expect("decode should succeed");
        assert!(reader.is_empty(), "decode must consume the exact wire width");
        decoded
    }

    #[tokio::test]
    async fn test_integers_round_trip_at_boundaries() {
        for v in [i8::MIN, -1, 0, 1, i8::MAX] {
            assert_eq!(round_trip(&v).await, v);
        }
        for v in [i16::MIN, -1, 0, i16::MAX] {
            assert_eq!(round_trip(&v).await, v);
        }
        for v in [i32::MIN, -1, 0, i32::MAX] {
            assert_eq!(round_trip(&v).await, v);
        }
        for v in [i64::MIN, -1, 0, i64::MAX] {
            assert_eq!(round_trip(&v).await, v);
        }
        for v in [u8::MIN, u8::MAX] {
            assert_eq!(round_trip(&v).await, v);
        }
        for v in [u64::MIN, u64::MAX] {
            assert_eq!(round_trip(&v).await, v);
        }
    }

    #[tokio::test]
    async fn test_integers_encode_big_endian() {
        let mut buf = Vec::new();
        0x0102_0304_i32.write(&mut buf).unwrap();
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);

        buf.clear();
        0x0102_i16.write(&mut buf).unwrap();
        assert_eq!(buf, [0x01, 0x02]);
    }

    #[tokio::test]
    async fn test_floats_round_trip_bit_for_bit() {
        for v in [0.0_f32, -0.0, 1.5, f32::MAX, f32::MIN_POSITIVE, f32::INFINITY, f32::NEG_INFINITY] {
            assert_eq!(round_trip(&v).await.to_bits(), v.to_bits());
        }
        // NaN compares unequal to itself, so compare the bit pattern.
        let nan = f32::from_bits(0x7fc0_dead);
        assert_eq!(round_trip(&nan).await.to_bits(), nan.to_bits());

        for v in [0.0_f64, -1.0e300, f64::INFINITY] {
            assert_eq!(round_trip(&v).await.to_bits(), v.to_bits());
        }
        let nan = f64::from_bits(0x7ff8_0000_0000_beef);
        assert_eq!(round_trip(&nan).await.to_bits(), nan.to_bits());
    }

    #[tokio::test]
    async fn test_bool_encodes_as_single_byte() {
        let mut buf = Vec::new();
        true.write(&mut buf).unwrap();
        false.write(&mut buf).unwrap();
        assert_eq!(buf, [1, 0]);
    }

    #[tokio::test]
    async fn test_bool_decodes_any_nonzero_as_true() {
        let mut reader = &[0x00_u8, 0x01, 0xff][..];
        assert!(!bool::read(&mut reader).await.unwrap());
        assert!(bool::read(&mut reader).await.unwrap());
        assert!(bool::read(&mut reader).await.unwrap());
    }

    #[tokio::test]
    async fn test_string_round_trips() {
        for s in ["", "hello", "snowman \u{2603}", "beyond bmp \u{1F4E6}"] {
            assert_eq!(round_trip(&s.to_string()).await, s);
        }
    }

    #[tokio::test]
    async fn test_string_wire_form_is_length_prefixed_utf16() {
        let mut buf = Vec::new();
        "hi".to_string().write(&mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x02, 0x00, b'h', 0x00, b'i']);
    }

    #[tokio::test]
    async fn test_string_empty_has_zero_length_prefix() {
        let mut buf = Vec::new();
        String::new().write(&mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x00]);
    }

    #[tokio::test]
    async fn test_string_negative_length_is_rejected() {
        let mut reader = &[0xff_u8, 0xff][..]; // length prefix -1
        let err = String::read(&mut reader).await.unwrap_err();
        assert!(matches!(err, CodecError::NegativeStringLength(-1)));
    }

    #[tokio::test]
    async fn test_string_too_long_is_rejected_on_encode() {
        let long = "x".repeat(i16::MAX as usize + 1);
        let mut buf = Vec::new();
        let err = long.write(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::StringTooLong(_)));
    }

    #[tokio::test]
    async fn test_short_read_propagates_io_error() {
        // An i32 needs 4 bytes; give it 2.
        let mut reader = &[0x01_u8, 0x02][..];
        let err = i32::read(&mut reader).await.unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }
}
