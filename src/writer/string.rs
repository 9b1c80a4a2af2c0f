//! String and binary writes

use bytes::BufMut;

use super::{MessagePackWriter, wire_len};
use crate::buffer::ByteSequence;
use crate::format::code::{
    BIN8, BIN16, BIN32, MAX_FIX_STRING_LENGTH, MIN_FIX_STR, STR8, STR16, STR32,
};
use crate::format::{MAX_STRING_HEADER_SIZE, MAX_UTF8_BYTES_PER_UTF16_UNIT};

/// Append the smallest string header for `byte_count` UTF-8 bytes
fn put_string_header<B: BufMut>(out: &mut B, byte_count: u32) {
    if byte_count <= MAX_FIX_STRING_LENGTH {
        #[allow(clippy::cast_possible_truncation)]
        out.put_u8(MIN_FIX_STR | byte_count as u8);
    } else if let Ok(len) = u8::try_from(byte_count) {
        out.put_u8(STR8);
        out.put_u8(len);
    } else if let Ok(len) = u16::try_from(byte_count) {
        out.put_u8(STR16);
        out.put_u16(len);
    } else {
        out.put_u8(STR32);
        out.put_u32(byte_count);
    }
}

impl MessagePackWriter {
    /// Write a binary header; the caller then writes `len` raw bytes
    pub fn write_bin_header(&mut self, len: u32) {
        let out = self.put(5);
        if let Ok(len) = u8::try_from(len) {
            out.put_u8(BIN8);
            out.put_u8(len);
        } else if let Ok(len) = u16::try_from(len) {
            out.put_u8(BIN16);
            out.put_u16(len);
        } else {
            out.put_u8(BIN32);
            out.put_u32(len);
        }
    }

    /// Write a binary value
    pub fn write_bin(&mut self, bytes: &[u8]) {
        self.write_bin_header(wire_len(bytes.len()));
        self.put(bytes.len()).put_slice(bytes);
    }

    /// Write a binary value, or nil for `None`
    pub fn write_bin_opt(&mut self, bytes: Option<&[u8]>) {
        match bytes {
            Some(bytes) => self.write_bin(bytes),
            None => self.write_nil(),
        }
    }

    /// Write a binary value gathered from every segment of `bytes`
    pub fn write_bin_sequence(&mut self, bytes: &ByteSequence<'_>) {
        self.write_bin_header(wire_len(bytes.len()));
        self.write_raw_sequence(bytes);
    }

    /// Write a string header; the caller then writes `byte_count` UTF-8 bytes
    pub fn write_string_header(&mut self, byte_count: u32) {
        put_string_header(self.put(MAX_STRING_HEADER_SIZE), byte_count);
    }

    /// Write a string
    pub fn write_str(&mut self, value: &str) {
        self.write_string_utf8(value.as_bytes());
    }

    /// Write a string, or nil for `None`
    pub fn write_str_opt(&mut self, value: Option<&str>) {
        match value {
            Some(value) => self.write_str(value),
            None => self.write_nil(),
        }
    }

    /// Write bytes that are already valid UTF-8 as a string
    pub fn write_string_utf8(&mut self, utf8: &[u8]) {
        let out = self.put(MAX_STRING_HEADER_SIZE + utf8.len());
        put_string_header(out, wire_len(utf8.len()));
        out.put_slice(utf8);
    }

    /// Write UTF-16 code units as a UTF-8 string in one encoding pass
    ///
    /// Room for the largest header and the worst-case expansion is reserved
    /// up front, the text is encoded after the header slot, then the real
    /// header is written and the text shifted left onto it. Unpaired
    /// surrogates are written as U+FFFD.
    pub fn write_utf16(&mut self, units: &[u16]) {
        let max_len = units.len() * MAX_UTF8_BYTES_PER_UTF16_UNIT;
        self.put(MAX_STRING_HEADER_SIZE + max_len);
        let start = self.buf.len();
        let body_start = start + MAX_STRING_HEADER_SIZE;
        self.buf.resize(body_start + max_len, 0);

        let mut written = 0;
        let body = &mut self.buf[body_start..];
        for ch in char::decode_utf16(units.iter().copied()) {
            let ch = ch.unwrap_or(char::REPLACEMENT_CHARACTER);
            written += ch.encode_utf8(&mut body[written..]).len();
        }

        let mut header = [0u8; MAX_STRING_HEADER_SIZE];
        let mut slot = &mut header[..];
        put_string_header(&mut slot, wire_len(written));
        let header_len = MAX_STRING_HEADER_SIZE - slot.len();

        self.buf[start..start + header_len].copy_from_slice(&header[..header_len]);
        self.buf
            .copy_within(body_start..body_start + written, start + header_len);
        self.buf.truncate(start + header_len + written);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MessagePackReader;

    fn encoded_str(value: &str) -> Vec<u8> {
        let mut writer = MessagePackWriter::new();
        writer.write_str(value);
        writer.flush_to_vec()
    }

    #[test]
    fn test_string_header_tiers() {
        assert_eq!(encoded_str("")[..], [0xa0]);
        assert_eq!(encoded_str(&"a".repeat(31))[0], 0xbf);
        assert_eq!(encoded_str(&"a".repeat(32))[..2], [0xd9, 32]);
        assert_eq!(encoded_str(&"a".repeat(255))[..2], [0xd9, 0xff]);
        assert_eq!(encoded_str(&"a".repeat(256))[..3], [0xda, 0x01, 0x00]);
        assert_eq!(
            encoded_str(&"a".repeat(65_536))[..5],
            [0xdb, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn test_bin_header_tiers() {
        let mut writer = MessagePackWriter::new();
        writer.write_bin(&[]);
        writer.write_bin_header(255);
        writer.write_bin_header(256);
        writer.write_bin_header(70_000);
        assert_eq!(
            writer.flush().as_ref(),
            [
                0xc4, 0x00, 0xc4, 0xff, 0xc5, 0x01, 0x00, 0xc6, 0x00, 0x01, 0x11, 0x70
            ]
        );
    }

    #[test]
    fn test_optional_values_write_nil() {
        let mut writer = MessagePackWriter::new();
        writer.write_str_opt(None);
        writer.write_bin_opt(None);
        writer.write_str_opt(Some("a"));
        writer.write_bin_opt(Some(&[7u8][..]));
        assert_eq!(writer.as_slice(), [0xc0, 0xc0, 0xa1, b'a', 0xc4, 0x01, 0x07]);
    }

    #[test]
    fn test_bin_sequence_matches_contiguous() {
        let data: Vec<u8> = (0..=255).collect();
        let seq = ByteSequence::from_segments([&data[..100], &data[100..]]);
        let mut split = MessagePackWriter::new();
        split.write_bin_sequence(&seq);
        let mut whole = MessagePackWriter::new();
        whole.write_bin(&data);
        assert_eq!(split.as_slice(), whole.as_slice());
    }

    #[test]
    fn test_utf16_matches_str() {
        let cyrillic = "ж".repeat(40);
        let long = "x".repeat(300);
        for text in ["", "ok", "héllo ✓", "🦀 crab", cyrillic.as_str(), long.as_str()] {
            let units: Vec<u16> = text.encode_utf16().collect();
            let mut writer = MessagePackWriter::new();
            writer.write_nil();
            writer.write_utf16(&units);
            let bytes = writer.flush_to_vec();
            assert_eq!(bytes[0], 0xc0);
            assert_eq!(bytes[1..], encoded_str(text)[..], "{text}");
        }
    }

    #[test]
    fn test_utf16_unpaired_surrogate() {
        let mut writer = MessagePackWriter::new();
        writer.write_utf16(&[0x61, 0xd800, 0x62]);
        let bytes = writer.flush_to_vec();
        let mut reader = MessagePackReader::new(&bytes);
        assert_eq!(reader.read_string().unwrap().as_deref(), Some("a\u{fffd}b"));
    }
}
