//! String and binary reads

use std::borrow::Cow;

use tracing::trace;

use super::MessagePackReader;
use crate::buffer::ByteSequence;
use crate::format::code::{BIN8, BIN16, BIN32, MAX_FIX_STR, MIN_FIX_STR, STR8, STR16, STR32};
use crate::format::{Error, MessagePackType, Result};

/// Byte length of the UTF-8 sequence introduced by `lead`
fn utf8_width(lead: u8) -> usize {
    match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}

/// Decode UTF-8, borrowing when the bytes are contiguous.
///
/// Split input is validated segment by segment straight into one `String`.
/// A character cut by a segment boundary is finished in a 4-byte carry.
fn decode_utf8<'a>(bytes: &ByteSequence<'a>) -> Result<Cow<'a, str>> {
    if let Some(span) = bytes.as_contiguous() {
        return Ok(Cow::Borrowed(std::str::from_utf8(span)?));
    }

    trace!(
        len = bytes.len(),
        segments = bytes.segment_count(),
        "decoding string across segments"
    );
    let mut text = String::with_capacity(bytes.len());
    let mut carry = [0u8; 4];
    let mut carried = 0;
    for segment in bytes.segments() {
        let mut rest = segment;
        if carried > 0 {
            let width = utf8_width(carry[0]);
            let take = (width - carried).min(rest.len());
            carry[carried..carried + take].copy_from_slice(&rest[..take]);
            carried += take;
            rest = &rest[take..];
            if carried < width {
                continue;
            }
            text.push_str(std::str::from_utf8(&carry[..carried])?);
            carried = 0;
        }
        match std::str::from_utf8(rest) {
            Ok(valid) => text.push_str(valid),
            // incomplete character at the end of the segment
            Err(err) if err.error_len().is_none() => {
                let (valid, tail) = rest.split_at(err.valid_up_to());
                text.push_str(std::str::from_utf8(valid)?);
                carry[..tail.len()].copy_from_slice(tail);
                carried = tail.len();
            }
            Err(err) => return Err(err.into()),
        }
    }
    // fails if the input ends inside a character
    text.push_str(std::str::from_utf8(&carry[..carried])?);
    Ok(Cow::Owned(text))
}

impl<'a> MessagePackReader<'a> {
    fn read_string_length(&mut self) -> Result<u32> {
        match self.read_code()? {
            code @ MIN_FIX_STR..=MAX_FIX_STR => Ok(u32::from(code - MIN_FIX_STR)),
            STR8 => Ok(u32::from(self.read_array::<1>()?[0])),
            STR16 => self.read_be_u16().map(u32::from),
            STR32 => self.read_be_u32(),
            other => Err(Error::unexpected(other, MessagePackType::String)),
        }
    }

    /// Binary length; fixstr, str16 and str32 are accepted for data written
    /// before the bin family existed.
    fn read_bytes_length(&mut self) -> Result<u32> {
        match self.read_code()? {
            BIN8 => Ok(u32::from(self.read_array::<1>()?[0])),
            BIN16 => self.read_be_u16().map(u32::from),
            BIN32 => self.read_be_u32(),
            code @ MIN_FIX_STR..=MAX_FIX_STR => Ok(u32::from(code - MIN_FIX_STR)),
            STR16 => self.read_be_u16().map(u32::from),
            STR32 => self.read_be_u32(),
            other => Err(Error::unexpected(other, MessagePackType::Binary)),
        }
    }

    /// Read a binary value as a zero-copy view, `None` for nil
    pub fn read_bytes(&mut self) -> Result<Option<ByteSequence<'a>>> {
        if self.try_read_nil() {
            return Ok(None);
        }
        self.transact(|reader| {
            let len = reader.read_bytes_length()?;
            reader.take(len).map(Some)
        })
    }

    /// Read a binary value into a new vector, `None` for nil
    pub fn read_bytes_to_vec(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.read_bytes()?.map(|bytes| bytes.to_vec()))
    }

    /// Read the raw UTF-8 bytes of a string, `None` for nil
    pub fn read_string_sequence(&mut self) -> Result<Option<ByteSequence<'a>>> {
        if self.try_read_nil() {
            return Ok(None);
        }
        self.transact(|reader| {
            let len = reader.read_string_length()?;
            reader.take(len).map(Some)
        })
    }

    /// Read a string, `None` for nil
    ///
    /// Borrows from the input when the string lies in one segment; otherwise
    /// the segments are validated in order into a single owned `String`.
    pub fn read_string(&mut self) -> Result<Option<Cow<'a, str>>> {
        let start = self.position();
        let Some(bytes) = self.read_string_sequence()? else {
            return Ok(None);
        };
        match decode_utf8(&bytes) {
            Ok(text) => Ok(Some(text)),
            Err(err) => {
                self.rewind(start);
                Err(err)
            }
        }
    }

    /// Read a string's bytes only if they are contiguous
    ///
    /// Returns `Ok(None)` without moving when the next value is nil or the
    /// payload crosses a segment boundary.
    pub fn try_read_string_span(&mut self) -> Result<Option<&'a [u8]>> {
        if self.is_nil() {
            return Ok(None);
        }
        let start = self.position();
        let len = self.transact(Self::read_string_length)?;
        let len = usize::try_from(len).map_err(|_| Error::InsufficientBuffer)?;
        if let Some(span) = self.cursor.try_take_contiguous(len) {
            return Ok(Some(span));
        }
        let missing = len > self.remaining();
        self.rewind(start);
        if missing {
            return Err(Error::InsufficientBuffer);
        }
        Ok(None)
    }
}
