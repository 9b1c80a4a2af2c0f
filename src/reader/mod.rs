//! MessagePack reader
//!
//! [`MessagePackReader`] decodes one primitive at a time from a borrowed,
//! possibly multi-segment [`ByteSequence`]. Integer reads accept any integer
//! encoding and narrow with overflow checks; header reads come in a throwing
//! form and a `try_` form that reports missing input as `Ok(None)`.
//!
//! A failed read never leaves the cursor part-way through a value: position
//! and depth are restored to where the read started.

mod extension;
mod skip;
mod string;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::buffer::{ByteSequence, Position, SequenceReader};
use crate::format::code::{
    self, ARRAY16, ARRAY32, FALSE, FLOAT32, FLOAT64, INT8, INT16, INT32, INT64, MAP16, MAP32,
    MAX_FIX_ARRAY, MAX_FIX_INT, MAX_FIX_MAP, MIN_FIX_ARRAY, MIN_FIX_MAP, MIN_NEGATIVE_FIX_INT,
    NIL, TRUE, UINT8, UINT16, UINT32, UINT64,
};
use crate::format::{Error, MessagePackType, Result, SecurityOptions};

/// Integer decoded at full width, before narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Integer {
    Unsigned(u64),
    Signed(i64),
}

impl Integer {
    fn narrow<T>(self) -> Result<T>
    where
        T: TryFrom<u64> + TryFrom<i64>,
    {
        let narrowed = match self {
            Self::Unsigned(value) => <T as TryFrom<u64>>::try_from(value).ok(),
            Self::Signed(value) => <T as TryFrom<i64>>::try_from(value).ok(),
        };
        narrowed.ok_or(Error::NumericOverflow {
            target: std::any::type_name::<T>(),
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_f64(self) -> f64 {
        match self {
            Self::Unsigned(value) => value as f64,
            Self::Signed(value) => value as f64,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_f32(self) -> f32 {
        match self {
            Self::Unsigned(value) => value as f32,
            Self::Signed(value) => value as f32,
        }
    }
}

/// Any numeric value, as found on the wire.
#[derive(Debug, Clone, Copy)]
enum Number {
    Float32(f32),
    Float64(f64),
    Integer(Integer),
}

macro_rules! read_integer_as {
    ($(#[$meta:meta])* $name:ident => $ty:ty) => {
        $(#[$meta])*
        pub fn $name(&mut self) -> Result<$ty> {
            self.transact(|reader| reader.read_integer(MessagePackType::Integer)?.narrow())
        }
    };
}

/// Cursor that decodes MessagePack values from a borrowed byte sequence
#[derive(Debug, Clone)]
pub struct MessagePackReader<'a> {
    cursor: SequenceReader<'a>,
    options: SecurityOptions,
    cancellation: CancellationToken,
    depth: usize,
}

impl<'a> MessagePackReader<'a> {
    /// Reader over `sequence` with default [`SecurityOptions`]
    pub fn new(sequence: impl Into<ByteSequence<'a>>) -> Self {
        Self::with_options(sequence, SecurityOptions::default())
    }

    /// Reader over `sequence` with explicit options
    pub fn with_options(sequence: impl Into<ByteSequence<'a>>, options: SecurityOptions) -> Self {
        Self {
            cursor: SequenceReader::new(sequence.into()),
            options,
            cancellation: CancellationToken::new(),
            depth: 0,
        }
    }

    /// Attach a cancellation token checked during bulk operations
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Options in effect
    #[must_use]
    pub fn options(&self) -> &SecurityOptions {
        &self.options
    }

    /// Cancellation token checked during bulk operations
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fail with [`Error::Cancelled`] if cancellation was requested
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// The complete input sequence
    #[must_use]
    pub fn sequence(&self) -> &ByteSequence<'a> {
        self.cursor.sequence()
    }

    /// Current position, usable with [`Self::rewind`]
    #[must_use]
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    /// Bytes consumed so far
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.cursor.consumed()
    }

    /// Bytes left to read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Whether the whole input has been consumed
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.cursor.is_end()
    }

    /// Return to an earlier position
    pub fn rewind(&mut self, position: Position) {
        self.cursor.rewind(position);
    }

    /// Independent copy of this reader at the same position
    #[must_use]
    pub fn create_peek_reader(&self) -> Self {
        self.clone()
    }

    /// Current array/map nesting depth
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Enter one nesting level, failing past [`SecurityOptions::max_depth`]
    pub fn depth_step(&mut self) -> Result<()> {
        if self.depth >= self.options.max_depth {
            debug!(max_depth = self.options.max_depth, "nesting depth limit reached");
            return Err(Error::DepthExceeded {
                max: self.options.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave one nesting level
    pub fn depth_unstep(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Leading code of the next value, without consuming it
    pub fn next_code(&self) -> Result<u8> {
        self.cursor.peek().ok_or(Error::InsufficientBuffer)
    }

    /// Category of the next value, without consuming it
    pub fn next_message_pack_type(&self) -> Result<MessagePackType> {
        self.next_code().map(MessagePackType::from_code)
    }

    /// Whether the next value is nil
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.cursor.peek() == Some(NIL)
    }

    /// Run `read`, restoring position and depth if it fails
    fn transact<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let position = self.cursor.position();
        let depth = self.depth;
        let result = read(self);
        if result.is_err() {
            self.cursor.rewind(position);
            self.depth = depth;
        }
        result
    }

    /// Like [`Self::transact`], mapping missing input to `Ok(None)`
    fn try_transact<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<Option<T>> {
        match self.transact(read) {
            Ok(value) => Ok(Some(value)),
            Err(Error::InsufficientBuffer) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn read_code(&mut self) -> Result<u8> {
        self.cursor.try_read().ok_or(Error::InsufficientBuffer)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.cursor
            .try_read_array::<N>()
            .ok_or(Error::InsufficientBuffer)
    }

    fn read_be_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    fn read_be_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    fn read_be_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_be_bytes)
    }

    fn take(&mut self, len: u32) -> Result<ByteSequence<'a>> {
        let len = usize::try_from(len).map_err(|_| Error::InsufficientBuffer)?;
        self.cursor.try_take(len).ok_or(Error::InsufficientBuffer)
    }

    /// Consume a nil
    pub fn read_nil(&mut self) -> Result<()> {
        self.transact(|reader| match reader.read_code()? {
            NIL => Ok(()),
            other => Err(Error::unexpected(other, MessagePackType::Nil)),
        })
    }

    /// Consume a nil if one is next; the cursor only moves on a match
    pub fn try_read_nil(&mut self) -> bool {
        if self.is_nil() {
            self.cursor.try_advance(1)
        } else {
            false
        }
    }

    /// Read a boolean
    pub fn read_bool(&mut self) -> Result<bool> {
        self.transact(|reader| match reader.read_code()? {
            TRUE => Ok(true),
            FALSE => Ok(false),
            other => Err(Error::unexpected(other, MessagePackType::Boolean)),
        })
    }

    fn read_integer(&mut self, expected: MessagePackType) -> Result<Integer> {
        let code = self.read_code()?;
        let value = match code {
            0..=MAX_FIX_INT => Integer::Unsigned(u64::from(code)),
            MIN_NEGATIVE_FIX_INT..=u8::MAX => Integer::Signed(i64::from(code as i8)),
            UINT8 => Integer::Unsigned(u64::from(self.read_array::<1>()?[0])),
            UINT16 => Integer::Unsigned(u64::from(self.read_be_u16()?)),
            UINT32 => Integer::Unsigned(u64::from(self.read_be_u32()?)),
            UINT64 => Integer::Unsigned(self.read_be_u64()?),
            INT8 => Integer::Signed(i64::from(i8::from_be_bytes(self.read_array()?))),
            INT16 => Integer::Signed(i64::from(i16::from_be_bytes(self.read_array()?))),
            INT32 => Integer::Signed(i64::from(i32::from_be_bytes(self.read_array()?))),
            INT64 => Integer::Signed(i64::from_be_bytes(self.read_array()?)),
            other => return Err(Error::unexpected(other, expected)),
        };
        Ok(value)
    }

    read_integer_as!(
        /// Read any integer encoding as `u8`, failing on overflow
        read_u8 => u8
    );
    read_integer_as!(
        /// Read any integer encoding as `i8`, failing on overflow
        read_i8 => i8
    );
    read_integer_as!(
        /// Read any integer encoding as `u16`, failing on overflow
        read_u16 => u16
    );
    read_integer_as!(
        /// Read any integer encoding as `i16`, failing on overflow
        read_i16 => i16
    );
    read_integer_as!(
        /// Read any integer encoding as `u32`, failing on overflow
        read_u32 => u32
    );
    read_integer_as!(
        /// Read any integer encoding as `i32`, failing on overflow
        read_i32 => i32
    );
    read_integer_as!(
        /// Read any integer encoding as `u64`, failing on negative values
        read_u64 => u64
    );
    read_integer_as!(
        /// Read any integer encoding as `i64`, failing above `i64::MAX`
        read_i64 => i64
    );

    fn read_number(&mut self) -> Result<Number> {
        match self.next_code()? {
            FLOAT32 => {
                self.cursor.try_advance(1);
                Ok(Number::Float32(f32::from_be_bytes(self.read_array()?)))
            }
            FLOAT64 => {
                self.cursor.try_advance(1);
                Ok(Number::Float64(f64::from_be_bytes(self.read_array()?)))
            }
            _ => self.read_integer(MessagePackType::Float).map(Number::Integer),
        }
    }

    /// Read a float32, float64 or any integer as `f32`
    ///
    /// float64 values and wide integers are rounded to the nearest `f32`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.transact(|reader| {
            Ok(match reader.read_number()? {
                Number::Float32(value) => value,
                Number::Float64(value) => value as f32,
                Number::Integer(value) => value.to_f32(),
            })
        })
    }

    /// Read a float32, float64 or any integer as `f64`
    pub fn read_f64(&mut self) -> Result<f64> {
        self.transact(|reader| {
            Ok(match reader.read_number()? {
                Number::Float32(value) => f64::from(value),
                Number::Float64(value) => value,
                Number::Integer(value) => value.to_f64(),
            })
        })
    }

    fn read_array_count(&mut self) -> Result<u32> {
        match self.read_code()? {
            code @ MIN_FIX_ARRAY..=MAX_FIX_ARRAY => Ok(u32::from(code & 0x0f)),
            ARRAY16 => self.read_be_u16().map(u32::from),
            ARRAY32 => self.read_be_u32(),
            other => Err(Error::unexpected(other, MessagePackType::Array)),
        }
    }

    fn read_map_count(&mut self) -> Result<u32> {
        match self.read_code()? {
            code @ MIN_FIX_MAP..=MAX_FIX_MAP => Ok(u32::from(code & 0x0f)),
            MAP16 => self.read_be_u16().map(u32::from),
            MAP32 => self.read_be_u32(),
            other => Err(Error::unexpected(other, MessagePackType::Map)),
        }
    }

    /// Fail if fewer than `min_bytes` remain after a collection header
    fn ensure_remaining(&self, min_bytes: u64, kind: MessagePackType) -> Result<()> {
        if min_bytes > self.cursor.remaining() as u64 {
            debug!(
                %kind,
                min_bytes,
                remaining = self.cursor.remaining(),
                "collection header claims more elements than bytes remain"
            );
            return Err(Error::InsufficientBuffer);
        }
        Ok(())
    }

    /// Read an array header
    ///
    /// Every element takes at least one byte, so a count larger than the
    /// remaining input is rejected before the caller allocates for it.
    pub fn read_array_header(&mut self) -> Result<u32> {
        self.transact(|reader| {
            let count = reader.read_array_count()?;
            reader.ensure_remaining(u64::from(count), MessagePackType::Array)?;
            Ok(count)
        })
    }

    /// Read an array header, or `Ok(None)` without moving if input is missing
    pub fn try_read_array_header(&mut self) -> Result<Option<u32>> {
        self.try_transact(Self::read_array_count)
    }

    /// Read a map header
    ///
    /// Every entry takes at least two bytes (key and value).
    pub fn read_map_header(&mut self) -> Result<u32> {
        self.transact(|reader| {
            let count = reader.read_map_count()?;
            reader.ensure_remaining(u64::from(count) * 2, MessagePackType::Map)?;
            Ok(count)
        })
    }

    /// Read a map header, or `Ok(None)` without moving if input is missing
    pub fn try_read_map_header(&mut self) -> Result<Option<u32>> {
        self.try_transact(Self::read_map_count)
    }

    /// Read a map header, also accepting an empty array as an empty map
    ///
    /// Older encoders wrote empty maps as `0x90`; only this entry point
    /// accepts that form.
    pub fn read_map_header_or_empty_array(&mut self) -> Result<u32> {
        if self.cursor.peek() == Some(code::MIN_FIX_ARRAY) {
            self.cursor.try_advance(1);
            return Ok(0);
        }
        self.read_map_header()
    }
}
