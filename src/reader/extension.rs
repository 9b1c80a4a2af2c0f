//! Extension and timestamp reads

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use super::MessagePackReader;
use crate::format::code::{EXT8, EXT16, EXT32, FIX_EXT1, FIX_EXT2, FIX_EXT4, FIX_EXT8, FIX_EXT16};
use crate::format::{
    Error, ExtensionHeader, ExtensionResult, ExtensionTypeCode, MessagePackType, Result, Timestamp,
};

/// Parse the string form some encoders use for timestamps.
fn parse_datetime(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Ok(value.with_timezone(&Utc));
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(value.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
        .ok_or_else(|| Error::InvalidTimestamp(text.to_owned()))
}

impl<'a> MessagePackReader<'a> {
    fn read_extension_header(&mut self) -> Result<ExtensionHeader> {
        let length = match self.read_code()? {
            FIX_EXT1 => 1,
            FIX_EXT2 => 2,
            FIX_EXT4 => 4,
            FIX_EXT8 => 8,
            FIX_EXT16 => 16,
            EXT8 => u32::from(self.read_array::<1>()?[0]),
            EXT16 => u32::from(self.read_be_u16()?),
            EXT32 => self.read_be_u32()?,
            other => return Err(Error::unexpected(other, MessagePackType::Extension)),
        };
        let type_code = i8::from_be_bytes(self.read_array()?);
        Ok(ExtensionHeader::new(type_code, length))
    }

    /// Read an extension header, checking that its payload is present
    pub fn read_extension_format_header(&mut self) -> Result<ExtensionHeader> {
        self.transact(|reader| {
            let header = reader.read_extension_header()?;
            if header.length() as usize > reader.remaining() {
                return Err(Error::InsufficientBuffer);
            }
            Ok(header)
        })
    }

    /// Read an extension header, or `Ok(None)` without moving if input is missing
    ///
    /// The payload is not required to be present yet.
    pub fn try_read_extension_format_header(&mut self) -> Result<Option<ExtensionHeader>> {
        self.try_transact(Self::read_extension_header)
    }

    /// Read an extension header and a zero-copy view of its payload
    pub fn read_extension_format(&mut self) -> Result<ExtensionResult<'a>> {
        self.transact(|reader| {
            let header = reader.read_extension_header()?;
            let data = reader.take(header.length())?;
            Ok(ExtensionResult::new(header.type_code(), data))
        })
    }

    /// Read a timestamp
    ///
    /// Accepts the timestamp extension in any of its three layouts, or a
    /// string holding an RFC 3339 / ISO 8601 date-time (assumed UTC when it
    /// carries no offset).
    pub fn read_datetime(&mut self) -> Result<DateTime<Utc>> {
        self.transact(|reader| {
            if reader.next_message_pack_type()? == MessagePackType::String {
                let text = reader.read_string()?.unwrap_or_default();
                debug!(%text, "decoding timestamp from string token");
                return parse_datetime(&text);
            }
            let header = reader.read_extension_format_header()?;
            reader.read_datetime_with_header(header)
        })
    }

    /// Read a timestamp payload whose header was already consumed
    pub fn read_datetime_with_header(&mut self, header: ExtensionHeader) -> Result<DateTime<Utc>> {
        if header.type_code() != ExtensionTypeCode::TIMESTAMP {
            return Err(Error::UnexpectedExtensionType {
                expected: ExtensionTypeCode::TIMESTAMP,
                actual: header.type_code(),
            });
        }
        let len = match header.length() {
            len @ (4 | 8 | 12) => len as usize,
            length => {
                return Err(Error::MalformedExtension {
                    type_code: header.type_code(),
                    length,
                });
            }
        };
        self.transact(|reader| {
            let mut payload = [0u8; 12];
            let data = reader.take(header.length())?;
            let mut filled = 0;
            for segment in data.segments() {
                payload[filled..filled + segment.len()].copy_from_slice(segment);
                filled += segment.len();
            }
            Timestamp::decode(&payload[..len])?.to_datetime()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteSequence;
    use chrono::TimeZone;

    #[test]
    fn test_fixext_and_ext_headers() {
        let bytes = [
            0xd4u8, 0x05, 0xaa, // fixext1
            0xc7, 0x03, 0x62, 1, 2, 3, // ext8, type 98
            0xc8, 0x00, 0x00, 0x63, // ext16, empty, type 99
        ];
        let mut r = MessagePackReader::new(&bytes);
        let first = r.read_extension_format().unwrap();
        assert_eq!(first.header(), ExtensionHeader::new(5, 1));
        assert_eq!(first.data(), &[0xaau8][..]);

        let second = r.read_extension_format().unwrap();
        assert_eq!(second.type_code(), ExtensionTypeCode::LZ4_BLOCK_ARRAY);
        assert_eq!(second.into_data().to_vec(), [1, 2, 3]);

        let third = r.read_extension_format_header().unwrap();
        assert_eq!(third, ExtensionHeader::new(ExtensionTypeCode::IDENTIFIER, 0));
        assert!(r.is_end());
    }

    #[test]
    fn test_extension_header_validates_payload() {
        let bytes = [0xc7u8, 0x10, 0x01, 0x00];
        let mut r = MessagePackReader::new(&bytes);
        assert_eq!(r.read_extension_format_header(), Err(Error::InsufficientBuffer));
        assert_eq!(r.consumed(), 0);
        assert_eq!(
            r.try_read_extension_format_header(),
            Ok(Some(ExtensionHeader::new(1, 16)))
        );
        assert_eq!(r.consumed(), 3);

        let mut r = MessagePackReader::new(&bytes[..2]);
        assert_eq!(r.try_read_extension_format_header(), Ok(None));
        assert_eq!(r.consumed(), 0);
    }

    #[test]
    fn test_read_timestamp_layouts() {
        // 32-bit: 2^31 seconds
        let bytes = [0xd6u8, 0xff, 0x80, 0x00, 0x00, 0x00];
        let expected = Utc.timestamp_opt(1 << 31, 0).unwrap();
        assert_eq!(MessagePackReader::new(&bytes).read_datetime().unwrap(), expected);

        // 64-bit: 1 second + 1 nanosecond
        let bytes = [0xd7u8, 0xff, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01];
        let expected = Utc.timestamp_opt(1, 1).unwrap();
        assert_eq!(MessagePackReader::new(&bytes).read_datetime().unwrap(), expected);

        // 96-bit: -1 second, 0 nanoseconds
        let mut bytes = vec![0xc7, 0x0c, 0xff, 0, 0, 0, 0];
        bytes.extend_from_slice(&(-1i64).to_be_bytes());
        let expected = Utc.timestamp_opt(-1, 0).unwrap();
        assert_eq!(MessagePackReader::new(&bytes).read_datetime().unwrap(), expected);
    }

    #[test]
    fn test_timestamp_payload_across_segments() {
        let bytes = [0xd7u8, 0xff, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01];
        let seq = ByteSequence::from_segments([&bytes[..5], &bytes[5..]]);
        let expected = Utc.timestamp_opt(1, 1).unwrap();
        assert_eq!(MessagePackReader::new(seq).read_datetime().unwrap(), expected);
    }

    #[test]
    fn test_timestamp_bad_length() {
        let bytes = [0xd5u8, 0xff, 0x00, 0x00];
        let mut r = MessagePackReader::new(&bytes);
        assert_eq!(
            r.read_datetime(),
            Err(Error::MalformedExtension {
                type_code: -1,
                length: 2
            })
        );
        assert_eq!(r.consumed(), 0);
    }

    #[test]
    fn test_timestamp_nanoseconds_out_of_range() {
        let mut bytes = vec![0xc7u8, 0x0c, 0xff, 0xff, 0xff, 0xff, 0xff];
        bytes.extend_from_slice(&i64::MAX.to_be_bytes());
        let mut r = MessagePackReader::new(&bytes);
        assert!(matches!(r.read_datetime(), Err(Error::InvalidTimestamp(_))));
        assert_eq!(r.consumed(), 0);
    }

    #[test]
    fn test_timestamp_wrong_type() {
        let bytes = [0xd6u8, 0x07, 0, 0, 0, 0];
        assert_eq!(
            MessagePackReader::new(&bytes).read_datetime(),
            Err(Error::UnexpectedExtensionType {
                expected: -1,
                actual: 7
            })
        );
    }

    #[test]
    fn test_timestamp_from_string() {
        let text = "2024-02-29T12:30:00Z";
        let mut bytes = vec![0xa0 | u8::try_from(text.len()).unwrap()];
        bytes.extend_from_slice(text.as_bytes());
        let expected = Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 0).unwrap();
        assert_eq!(MessagePackReader::new(&bytes).read_datetime().unwrap(), expected);

        assert_eq!(
            parse_datetime("2024-02-29T12:30:00.5").unwrap(),
            expected + chrono::Duration::milliseconds(500)
        );
        assert_eq!(
            parse_datetime("2024-02-29").unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_datetime("yesterday"),
            Err(Error::InvalidTimestamp(_))
        ));
    }
}
