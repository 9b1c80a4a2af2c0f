//! Extension and timestamp writes

use bytes::BufMut;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use super::{MessagePackWriter, wire_len};
use crate::format::code::{EXT8, EXT16, EXT32, FIX_EXT1, FIX_EXT2, FIX_EXT4, FIX_EXT8, FIX_EXT16};
use crate::format::{
    ExtensionHeader, ExtensionResult, ExtensionTypeCode, MAX_HEADER_SIZE, Timestamp,
};

impl MessagePackWriter {
    /// Write an extension header; the caller then writes `header.length()` bytes
    pub fn write_extension_format_header(&mut self, header: &ExtensionHeader) {
        let out = self.put(MAX_HEADER_SIZE);
        match header.length() {
            1 => out.put_u8(FIX_EXT1),
            2 => out.put_u8(FIX_EXT2),
            4 => out.put_u8(FIX_EXT4),
            8 => out.put_u8(FIX_EXT8),
            16 => out.put_u8(FIX_EXT16),
            length => {
                if let Ok(length) = u8::try_from(length) {
                    out.put_u8(EXT8);
                    out.put_u8(length);
                } else if let Ok(length) = u16::try_from(length) {
                    out.put_u8(EXT16);
                    out.put_u16(length);
                } else {
                    out.put_u8(EXT32);
                    out.put_u32(length);
                }
            }
        }
        out.put_i8(header.type_code());
    }

    /// Write an extension header followed by its payload
    pub fn write_extension_format(&mut self, extension: &ExtensionResult<'_>) {
        self.write_extension_format_header(&extension.header());
        self.write_raw_sequence(extension.data());
    }

    /// Write a contiguous payload under extension `type_code`
    pub fn write_extension(&mut self, type_code: i8, data: &[u8]) {
        self.write_extension_format_header(&ExtensionHeader::new(type_code, wire_len(data.len())));
        self.write_raw(data);
    }

    /// Write a timestamp extension in its most compact layout
    pub fn write_timestamp(&mut self, timestamp: Timestamp) {
        let len = timestamp.encoded_len();
        self.write_extension_format_header(&ExtensionHeader::new(
            ExtensionTypeCode::TIMESTAMP,
            wire_len(len),
        ));
        timestamp.encode_into(self.put(len));
    }

    /// Write a date-time as a timestamp extension, converting it to UTC first
    pub fn write_datetime<Tz: TimeZone>(&mut self, value: &DateTime<Tz>) {
        self.write_timestamp(Timestamp::from(value.with_timezone(&Utc)));
    }

    /// Write a date-time with no zone as a timestamp extension
    ///
    /// The value is written as if it were UTC, without any conversion.
    pub fn write_naive_datetime(&mut self, value: &NaiveDateTime) {
        self.write_timestamp(Timestamp::from(value.and_utc()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteSequence;
    use crate::reader::MessagePackReader;
    use chrono::FixedOffset;

    fn encoded(write: impl FnOnce(&mut MessagePackWriter)) -> Vec<u8> {
        let mut writer = MessagePackWriter::new();
        write(&mut writer);
        writer.flush_to_vec()
    }

    #[test]
    fn test_extension_header_forms() {
        let header = |len| encoded(|w| w.write_extension_format_header(&ExtensionHeader::new(5, len)));
        assert_eq!(header(1), [0xd4, 0x05]);
        assert_eq!(header(2), [0xd5, 0x05]);
        assert_eq!(header(4), [0xd6, 0x05]);
        assert_eq!(header(8), [0xd7, 0x05]);
        assert_eq!(header(16), [0xd8, 0x05]);
        assert_eq!(header(0), [0xc7, 0x00, 0x05]);
        assert_eq!(header(3), [0xc7, 0x03, 0x05]);
        assert_eq!(header(256), [0xc8, 0x01, 0x00, 0x05]);
        assert_eq!(header(65_536), [0xc9, 0x00, 0x01, 0x00, 0x00, 0x05]);
        for len in [0, 1, 3, 16, 17, 256, 65_536] {
            assert_eq!(header(len).len(), ExtensionHeader::new(5, len).encoded_len());
        }
    }

    #[test]
    fn test_extension_round_trip() {
        let payload = [1u8, 2, 3];
        let bytes = encoded(|w| {
            w.write_extension(ExtensionTypeCode::LZ4_BLOCK_ARRAY, &payload);
            w.write_extension_format(&ExtensionResult::new(
                ExtensionTypeCode::IDENTIFIER,
                ByteSequence::from_segments([&payload[..1], &payload[1..]]),
            ));
        });
        let mut reader = MessagePackReader::new(&bytes);
        for type_code in [ExtensionTypeCode::LZ4_BLOCK_ARRAY, ExtensionTypeCode::IDENTIFIER] {
            let ext = reader.read_extension_format().unwrap();
            assert_eq!(ext.type_code(), type_code);
            assert_eq!(ext.data(), &payload[..]);
        }
        assert!(reader.is_end());
    }

    #[test]
    fn test_timestamp_layouts() {
        let bytes = encoded(|w| w.write_timestamp(Timestamp::new(1 << 31, 0)));
        assert_eq!(bytes, [0xd6, 0xff, 0x80, 0x00, 0x00, 0x00]);

        let bytes = encoded(|w| w.write_timestamp(Timestamp::new(1, 1)));
        assert_eq!(bytes, [0xd7, 0xff, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01]);

        let bytes = encoded(|w| w.write_timestamp(Timestamp::new(-1, 0)));
        assert_eq!(bytes[..3], [0xc7, 0x0c, 0xff]);
        assert_eq!(bytes.len(), 15);
    }

    #[test]
    fn test_datetime_converts_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let utc = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(
            encoded(|w| w.write_datetime(&local)),
            encoded(|w| w.write_datetime(&utc))
        );

        let bytes = encoded(|w| w.write_datetime(&local));
        assert_eq!(MessagePackReader::new(&bytes).read_datetime().unwrap(), utc);
    }

    #[test]
    fn test_naive_datetime_written_untouched() {
        let naive = NaiveDateTime::parse_from_str("2024-06-01T12:00:00.25", "%Y-%m-%dT%H:%M:%S%.f")
            .unwrap();
        let bytes = encoded(|w| w.write_naive_datetime(&naive));
        let read = MessagePackReader::new(&bytes).read_datetime().unwrap();
        assert_eq!(read.naive_utc(), naive);
    }

    #[test]
    fn test_pre_epoch_datetime() {
        let value = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::nanoseconds(7);
        let bytes = encoded(|w| w.write_datetime(&value));
        assert_eq!(bytes[0], 0xc7);
        assert_eq!(MessagePackReader::new(&bytes).read_datetime().unwrap(), value);
    }
}
