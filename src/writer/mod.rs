//! MessagePack writer
//!
//! [`MessagePackWriter`] appends values to a growable [`BytesMut`], always
//! choosing the most compact encoding for integers and headers. Writes never
//! fail; the accumulated bytes are taken with [`MessagePackWriter::flush`].

mod extension;
mod string;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::buffer::ByteSequence;
use crate::format::code::{
    ARRAY16, ARRAY32, FALSE, FLOAT32, FLOAT64, INT8, INT16, INT32, INT64, MAP16, MAP32,
    MAX_FIX_COLLECTION_COUNT, MAX_FIX_INT, MIN_FIX_ARRAY, MIN_FIX_MAP, MIN_FIX_NEGATIVE_INT, NIL,
    TRUE, UINT8, UINT16, UINT32, UINT64,
};
use crate::format::{Error, Result};

/// Initial capacity of a writer created with [`MessagePackWriter::new`]
const DEFAULT_CAPACITY: usize = 256;

/// Length of a string, binary or extension payload as carried on the wire
///
/// # Panics
///
/// Panics if `len` does not fit the 32-bit length field of the format.
fn wire_len(len: usize) -> u32 {
    match u32::try_from(len) {
        Ok(len) => len,
        Err(_) => panic!("length {len} exceeds the MessagePack 32-bit limit"),
    }
}

/// Append the smallest array (or map) header for `count`
fn put_collection_header<B: BufMut>(out: &mut B, count: u32, fix: u8, code16: u8, code32: u8) {
    if count <= MAX_FIX_COLLECTION_COUNT {
        #[allow(clippy::cast_possible_truncation)]
        out.put_u8(fix | count as u8);
    } else if let Ok(count) = u16::try_from(count) {
        out.put_u8(code16);
        out.put_u16(count);
    } else {
        out.put_u8(code32);
        out.put_u32(count);
    }
}

/// Append-only MessagePack encoder over a growable buffer
#[derive(Debug, Clone)]
pub struct MessagePackWriter {
    buf: BytesMut,
    /// Bytes handed out by [`Self::get_span`] and not yet committed
    pending: usize,
    cancellation: CancellationToken,
}

impl MessagePackWriter {
    /// Writer with a small initial buffer
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Writer with room for `capacity` bytes before growing
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(BytesMut::with_capacity(capacity))
    }

    /// Attach a cancellation token for formatters that encode bulk data
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Cancellation token carried by this writer
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

    /// Bytes written so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len() - self.pending
    }

    /// Whether nothing has been written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes written so far, as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Take everything written so far, leaving the writer empty for reuse
    pub fn flush(&mut self) -> Bytes {
        self.discard_pending();
        self.buf.split().freeze()
    }

    /// Like [`Self::flush`], returning an owned vector
    pub fn flush_to_vec(&mut self) -> Vec<u8> {
        self.flush().into()
    }

    /// Consume the writer, returning its buffer
    #[must_use]
    pub fn into_inner(mut self) -> BytesMut {
        self.discard_pending();
        self.buf
    }

    /// Make room for `additional` more bytes
    fn reserve(&mut self, additional: usize) {
        if self.buf.capacity() - self.buf.len() < additional {
            trace!(
                len = self.buf.len(),
                capacity = self.buf.capacity(),
                additional,
                "growing output buffer"
            );
        }
        self.buf.reserve(additional);
    }

    fn discard_pending(&mut self) {
        let len = self.buf.len() - self.pending;
        self.buf.truncate(len);
        self.pending = 0;
    }

    /// Writable span of at least `size_hint` bytes at the end of the output
    ///
    /// Nothing in the span counts as written until [`Self::advance`]
    /// commits it. A later call replaces any uncommitted span.
    pub fn get_span(&mut self, size_hint: usize) -> &mut [u8] {
        self.discard_pending();
        let start = self.buf.len();
        self.reserve(size_hint);
        self.buf.resize(start + size_hint, 0);
        self.pending = size_hint;
        &mut self.buf[start..]
    }

    /// Commit the first `count` bytes of the span from [`Self::get_span`]
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the span.
    pub fn advance(&mut self, count: usize) {
        assert!(
            count <= self.pending,
            "advanced {count} bytes past a span of {}",
            self.pending
        );
        self.pending -= count;
        self.discard_pending();
    }

    /// Append bytes that are already MessagePack encoded
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.discard_pending();
        self.reserve(bytes.len());
        self.buf.put_slice(bytes);
    }

    /// Append every segment of an already encoded sequence
    pub fn write_raw_sequence(&mut self, bytes: &ByteSequence<'_>) {
        self.discard_pending();
        self.reserve(bytes.len());
        for segment in bytes.segments() {
            self.buf.put_slice(segment);
        }
    }

    /// Reserve `len` bytes and return the buffer to append into
    fn put(&mut self, len: usize) -> &mut BytesMut {
        self.discard_pending();
        self.reserve(len);
        &mut self.buf
    }

    /// Write nil
    pub fn write_nil(&mut self) {
        self.put(1).put_u8(NIL);
    }

    /// Write a boolean
    pub fn write_bool(&mut self, value: bool) {
        self.put(1).put_u8(if value { TRUE } else { FALSE });
    }

    /// Write an unsigned integer in its most compact form
    pub fn write_u64(&mut self, value: u64) {
        let out = self.put(9);
        if value <= u64::from(MAX_FIX_INT) {
            #[allow(clippy::cast_possible_truncation)]
            out.put_u8(value as u8);
        } else if let Ok(value) = u8::try_from(value) {
            out.put_u8(UINT8);
            out.put_u8(value);
        } else if let Ok(value) = u16::try_from(value) {
            out.put_u8(UINT16);
            out.put_u16(value);
        } else if let Ok(value) = u32::try_from(value) {
            out.put_u8(UINT32);
            out.put_u32(value);
        } else {
            out.put_u8(UINT64);
            out.put_u64(value);
        }
    }

    /// Write a signed integer in its most compact form
    ///
    /// Non-negative values use the unsigned encodings.
    pub fn write_i64(&mut self, value: i64) {
        if let Ok(value) = u64::try_from(value) {
            return self.write_u64(value);
        }
        let out = self.put(9);
        if value >= MIN_FIX_NEGATIVE_INT {
            #[allow(clippy::cast_possible_truncation)]
            out.put_i8(value as i8);
        } else if let Ok(value) = i8::try_from(value) {
            out.put_u8(INT8);
            out.put_i8(value);
        } else if let Ok(value) = i16::try_from(value) {
            out.put_u8(INT16);
            out.put_i16(value);
        } else if let Ok(value) = i32::try_from(value) {
            out.put_u8(INT32);
            out.put_i32(value);
        } else {
            out.put_u8(INT64);
            out.put_i64(value);
        }
    }

    /// Write a `u8` in its most compact form
    pub fn write_u8(&mut self, value: u8) {
        self.write_u64(u64::from(value));
    }

    /// Write a `u16` in its most compact form
    pub fn write_u16(&mut self, value: u16) {
        self.write_u64(u64::from(value));
    }

    /// Write a `u32` in its most compact form
    pub fn write_u32(&mut self, value: u32) {
        self.write_u64(u64::from(value));
    }

    /// Write an `i8` in its most compact form
    pub fn write_i8(&mut self, value: i8) {
        self.write_i64(i64::from(value));
    }

    /// Write an `i16` in its most compact form
    pub fn write_i16(&mut self, value: i16) {
        self.write_i64(i64::from(value));
    }

    /// Write an `i32` in its most compact form
    pub fn write_i32(&mut self, value: i32) {
        self.write_i64(i64::from(value));
    }

    /// Write a `u8` as uint8, whatever its value
    pub fn write_u8_explicit(&mut self, value: u8) {
        let out = self.put(2);
        out.put_u8(UINT8);
        out.put_u8(value);
    }

    /// Write an `i8` as int8, whatever its value
    pub fn write_i8_explicit(&mut self, value: i8) {
        let out = self.put(2);
        out.put_u8(INT8);
        out.put_i8(value);
    }

    /// Write a `u16` as uint16, whatever its value
    pub fn write_u16_explicit(&mut self, value: u16) {
        let out = self.put(3);
        out.put_u8(UINT16);
        out.put_u16(value);
    }

    /// Write an `i16` as int16, whatever its value
    pub fn write_i16_explicit(&mut self, value: i16) {
        let out = self.put(3);
        out.put_u8(INT16);
        out.put_i16(value);
    }

    /// Write a `u32` as uint32, whatever its value
    pub fn write_u32_explicit(&mut self, value: u32) {
        let out = self.put(5);
        out.put_u8(UINT32);
        out.put_u32(value);
    }

    /// Write an `i32` as int32, whatever its value
    pub fn write_i32_explicit(&mut self, value: i32) {
        let out = self.put(5);
        out.put_u8(INT32);
        out.put_i32(value);
    }

    /// Write a `u64` as uint64, whatever its value
    pub fn write_u64_explicit(&mut self, value: u64) {
        let out = self.put(9);
        out.put_u8(UINT64);
        out.put_u64(value);
    }

    /// Write an `i64` as int64, whatever its value
    pub fn write_i64_explicit(&mut self, value: i64) {
        let out = self.put(9);
        out.put_u8(INT64);
        out.put_i64(value);
    }

    /// Write a float32
    pub fn write_f32(&mut self, value: f32) {
        let out = self.put(5);
        out.put_u8(FLOAT32);
        out.put_f32(value);
    }

    /// Write a float64
    pub fn write_f64(&mut self, value: f64) {
        let out = self.put(9);
        out.put_u8(FLOAT64);
        out.put_f64(value);
    }

    /// Write an array header; the caller then writes `count` values
    pub fn write_array_header(&mut self, count: u32) {
        put_collection_header(self.put(5), count, MIN_FIX_ARRAY, ARRAY16, ARRAY32);
    }

    /// Write a map header; the caller then writes `count` key/value pairs
    pub fn write_map_header(&mut self, count: u32) {
        put_collection_header(self.put(5), count, MIN_FIX_MAP, MAP16, MAP32);
    }
}

impl Default for MessagePackWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BytesMut> for MessagePackWriter {
    /// Writer appending after whatever `buf` already holds
    fn from(buf: BytesMut) -> Self {
        Self {
            buf,
            pending: 0,
            cancellation: CancellationToken::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MessagePackReader;

    fn written(write: impl FnOnce(&mut MessagePackWriter)) -> Vec<u8> {
        let mut writer = MessagePackWriter::new();
        write(&mut writer);
        writer.flush_to_vec()
    }

    #[test]
    fn test_small_array_scenario() {
        let mut writer = MessagePackWriter::new();
        writer.write_array_header(4);
        writer.write_i32(1);
        writer.write_str("ok");
        writer.write_bool(true);
        writer.write_nil();
        assert_eq!(
            writer.flush().as_ref(),
            [0x94, 0x01, 0xa2, 0x6f, 0x6b, 0xc3, 0xc0]
        );
        assert!(writer.is_empty());
    }

    #[test]
    fn test_integer_compactness() {
        let cases: &[(i64, &[u8])] = &[
            (0, &[0x00]),
            (127, &[0x7f]),
            (128, &[0xcc, 0x80]),
            (255, &[0xcc, 0xff]),
            (256, &[0xcd, 0x01, 0x00]),
            (65_536, &[0xce, 0x00, 0x01, 0x00, 0x00]),
            (1 << 32, &[0xcf, 0, 0, 0, 1, 0, 0, 0, 0]),
            (-1, &[0xff]),
            (-32, &[0xe0]),
            (-33, &[0xd0, 0xdf]),
            (-128, &[0xd0, 0x80]),
            (-129, &[0xd1, 0xff, 0x7f]),
            (-32_769, &[0xd2, 0xff, 0xff, 0x7f, 0xff]),
            (i64::MIN, &[0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]),
        ];
        for (value, expected) in cases {
            assert_eq!(written(|w| w.write_i64(*value)), *expected, "{value}");
        }
        assert_eq!(written(|w| w.write_u64(u64::MAX))[0], UINT64);
        assert_eq!(written(|w| w.write_i8(-5)), [0xfb]);
        assert_eq!(written(|w| w.write_u16(200)), [0xcc, 0xc8]);
    }

    #[test]
    fn test_explicit_widths() {
        assert_eq!(written(|w| w.write_u8_explicit(1)), [0xcc, 0x01]);
        assert_eq!(written(|w| w.write_i8_explicit(1)), [0xd0, 0x01]);
        assert_eq!(written(|w| w.write_u16_explicit(1)), [0xcd, 0x00, 0x01]);
        assert_eq!(written(|w| w.write_i32_explicit(-1)), [0xd2, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(written(|w| w.write_u64_explicit(0)).len(), 9);
        assert_eq!(written(|w| w.write_i64_explicit(0))[0], INT64);

        // readers accept any width
        let bytes = written(|w| w.write_u32_explicit(7));
        assert_eq!(MessagePackReader::new(&bytes).read_u8().unwrap(), 7);
    }

    #[test]
    fn test_floats_keep_their_width() {
        assert_eq!(written(|w| w.write_f32(1.0)), [0xca, 0x3f, 0x80, 0x00, 0x00]);
        let bytes = written(|w| w.write_f64(0.5));
        assert_eq!(bytes[0], 0xcb);
        assert_eq!(MessagePackReader::new(&bytes).read_f64().unwrap(), 0.5);
    }

    #[test]
    fn test_collection_header_tiers() {
        assert_eq!(written(|w| w.write_array_header(15)), [0x9f]);
        assert_eq!(written(|w| w.write_array_header(16)), [0xdc, 0x00, 0x10]);
        assert_eq!(written(|w| w.write_array_header(65_535)), [0xdc, 0xff, 0xff]);
        assert_eq!(
            written(|w| w.write_array_header(65_536)),
            [0xdd, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(written(|w| w.write_map_header(0)), [0x80]);
        assert_eq!(written(|w| w.write_map_header(16)), [0xde, 0x00, 0x10]);
        assert_eq!(written(|w| w.write_map_header(u32::MAX))[0], MAP32);
    }

    #[test]
    fn test_span_commit() {
        let mut writer = MessagePackWriter::with_capacity(1);
        writer.write_nil();
        let span = writer.get_span(8);
        assert!(span.len() >= 8);
        span[..2].copy_from_slice(&[0x92, 0x01]);
        assert_eq!(writer.len(), 1);
        writer.advance(2);
        writer.write_u8(2);
        assert_eq!(writer.as_slice(), [0xc0, 0x92, 0x01, 0x02]);

        // an uncommitted span is dropped
        writer.get_span(4)[0] = 0xff;
        assert_eq!(writer.flush().as_ref(), [0xc0, 0x92, 0x01, 0x02]);
    }

    #[test]
    fn test_raw_and_reuse() {
        let mut writer = MessagePackWriter::from(BytesMut::from(&[0x92u8][..]));
        writer.write_raw(&[0x01]);
        writer.write_raw_sequence(&ByteSequence::from_segments([&[0xa1u8][..], &b"z"[..]]));
        assert_eq!(writer.flush_to_vec(), [0x92, 0x01, 0xa1, b'z']);

        writer.write_bool(false);
        assert_eq!(writer.into_inner().as_ref(), [0xc2]);
    }

    #[test]
    fn test_cancellation() {
        let token = CancellationToken::new();
        let writer = MessagePackWriter::new().with_cancellation(token.clone());
        assert!(writer.check_cancelled().is_ok());
        token.cancel();
        assert_eq!(writer.check_cancelled(), Err(Error::Cancelled));
    }
}
