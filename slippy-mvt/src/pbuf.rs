//! # Restricted protobuf wire reader
//!
//! Vector tiles are encoded as Protocol Buffers messages, but only a handful
//! of wire constructs actually occur: varints, zigzag-coded signed values,
//! length-delimited strings/messages, and packed repeated varints.
//! This module implements exactly that subset over a borrowed byte slice.
//!
//! See Google's [protobuf docs](https://protobuf.dev/programming-guides/encoding/)
//! for info on varint encoding generally.

use num_enum::TryFromPrimitive;
use thiserror::Error;

/// Errors produced while decoding tile bytes.
///
/// None of these are fatal to the viewer: a failed decode marks the owning
/// tile as errored and the pipeline moves on.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    #[error("unexpected end of buffer at offset {offset}")]
    Truncated { offset: usize },
    #[error("unknown wire type {0}")]
    UnknownWireType(u8),
    #[error("unknown geometry command {0}")]
    UnknownGeometryCommand(u8),
    #[error("geometry command stream ended mid-parameter")]
    TruncatedGeometry,
    #[error("string field is not valid UTF-8")]
    InvalidString,
    #[error("feature tag index {index} is out of range for this layer")]
    TagIndexOutOfRange { index: usize },
    #[error("feature tag list has an odd number of entries")]
    DanglingTagPair,
}

/// The protobuf wire types used by the vector tile schema.
///
/// Groups (wire types 3 and 4) are long deprecated and never appear in tiles;
/// encountering one is a [`DecodeError::UnknownWireType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Len = 2,
    Fixed32 = 5,
}

/// A field tag: the field number paired with its wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTag {
    pub field: u64,
    pub wire_type: WireType,
}

/// Decodes a zigzag-coded unsigned value back into a signed one.
///
/// Zigzag keeps small-magnitude values small after varint encoding:
/// 0 → 0, 1 → -1, 2 → 1, 3 → -2, ...
#[inline]
#[expect(clippy::cast_possible_wrap)]
pub const fn decode_zigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// A cursor over a byte slice with the restricted protobuf read operations.
///
/// Readers are cheap to clone; a clone is an independent cursor over the same
/// underlying bytes.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The current byte offset from the start of the slice.
    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or(DecodeError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::Truncated { offset: self.pos })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Reads a base-128 varint.
    ///
    /// Values wider than 64 bits are not rejected; the excess bits are
    /// silently discarded. Existing tile encoders rely on this wraparound,
    /// so we reproduce it rather than adding an overflow error.
    ///
    /// # Errors
    ///
    /// Fails only if the buffer ends before a byte without the continuation
    /// bit is found.
    pub fn varint(&mut self) -> Result<u64, DecodeError> {
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let b = self.byte()?;
            if shift < 64 {
                value |= u64::from(b & 0x7f) << shift;
            }
            if b & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Reads a zigzag-coded signed varint.
    ///
    /// # Errors
    ///
    /// See [`Reader::varint`].
    pub fn zigzag(&mut self) -> Result<i64, DecodeError> {
        Ok(decode_zigzag(self.varint()?))
    }

    /// Reads a field tag (field number + wire type).
    ///
    /// # Errors
    ///
    /// Fails on a truncated varint or a wire type outside the supported set.
    pub fn tag(&mut self) -> Result<FieldTag, DecodeError> {
        let key = self.varint()?;
        #[expect(clippy::cast_possible_truncation)]
        let wire_bits = (key & 0x7) as u8;
        let wire_type =
            WireType::try_from(wire_bits).map_err(|_| DecodeError::UnknownWireType(wire_bits))?;
        Ok(FieldTag {
            field: key >> 3,
            wire_type,
        })
    }

    /// Reads a length-delimited byte slice.
    ///
    /// # Errors
    ///
    /// Fails if the length prefix is truncated or declares more bytes than
    /// remain in the buffer.
    pub fn bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.varint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::Truncated { offset: self.pos })?;
        self.take(len)
    }

    /// Reads a length-delimited UTF-8 string.
    ///
    /// # Errors
    ///
    /// Fails on truncation or invalid UTF-8.
    pub fn string(&mut self) -> Result<&'a str, DecodeError> {
        std::str::from_utf8(self.bytes()?).map_err(|_| DecodeError::InvalidString)
    }

    /// Reads a little-endian 32-bit float.
    ///
    /// # Errors
    ///
    /// Fails if fewer than 4 bytes remain.
    pub fn fixed32(&mut self) -> Result<f32, DecodeError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(f32::from_le_bytes(bytes))
    }

    /// Reads a little-endian 64-bit float.
    ///
    /// # Errors
    ///
    /// Fails if fewer than 8 bytes remain.
    pub fn fixed64(&mut self) -> Result<f64, DecodeError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(bytes))
    }

    /// Reads a length-delimited sub-message and returns a reader scoped to
    /// exactly its declared byte width.
    ///
    /// The sub-reader cannot read past the message boundary, and the parent
    /// cursor is already advanced past it, so over- and under-shoot both
    /// surface as truncation errors local to the message.
    ///
    /// # Errors
    ///
    /// Fails if the declared length exceeds the remaining bytes.
    pub fn message(&mut self) -> Result<Reader<'a>, DecodeError> {
        Ok(Reader::new(self.bytes()?))
    }

    /// Reads a packed repeated varint field as an iterator.
    ///
    /// The iterator is bounded by the declared byte width of the field and
    /// yields decoded varints until it is exhausted.
    ///
    /// # Errors
    ///
    /// Fails if the length prefix is truncated or overruns the buffer.
    pub fn packed_varints(&mut self) -> Result<PackedVarints<'a>, DecodeError> {
        Ok(PackedVarints {
            inner: Reader::new(self.bytes()?),
        })
    }

    /// Skips over a field of the given wire type.
    ///
    /// # Errors
    ///
    /// Fails on truncation.
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        match wire_type {
            WireType::Varint => {
                self.varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::Len => {
                self.bytes()?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
        }
        Ok(())
    }
}

/// Iterator over a packed repeated varint field.
///
/// Yields until the declared field width is exhausted; a varint running off
/// the end of the field yields a final `Err`.
pub struct PackedVarints<'a> {
    inner: Reader<'a>,
}

impl Iterator for PackedVarints<'_> {
    type Item = Result<u64, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.inner.is_empty() {
            None
        } else {
            Some(self.inner.varint())
        }
    }
}
