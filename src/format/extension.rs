//! Extension headers and reserved extension type codes

use crate::buffer::ByteSequence;

/// Extension type codes with a meaning assigned by this library or by the format
pub struct ExtensionTypeCode;

impl ExtensionTypeCode {
    /// Standard MessagePack timestamp extension
    pub const TIMESTAMP: i8 = -1;
    /// Array payload compressed as LZ4 blocks
    pub const LZ4_BLOCK_ARRAY: i8 = 98;
    /// Identifier (culture string key) payload
    pub const IDENTIFIER: i8 = 99;
}

/// Header of an extension value
///
/// # Wire Format
///
/// ```text
/// fixext N : [code] [type]              [N bytes]       N in {1, 2, 4, 8, 16}
/// ext 8    : [0xc7] [len u8]  [type]    [len bytes]
/// ext 16   : [0xc8] [len u16] [type]    [len bytes]
/// ext 32   : [0xc9] [len u32] [type]    [len bytes]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtensionHeader {
    type_code: i8,
    length: u32,
}

impl ExtensionHeader {
    /// Create a new extension header
    #[must_use]
    pub const fn new(type_code: i8, length: u32) -> Self {
        Self { type_code, length }
    }

    /// Application-defined type tag
    #[must_use]
    pub const fn type_code(&self) -> i8 {
        self.type_code
    }

    /// Payload length in bytes, not counting the header
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Number of bytes the header itself occupies on the wire
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        match self.length {
            1 | 2 | 4 | 8 | 16 => 2,
            0..=0xff => 3,
            0x100..=0xffff => 4,
            _ => 6,
        }
    }
}

/// An extension header together with a zero-copy view of its payload
#[derive(Debug, Clone)]
pub struct ExtensionResult<'a> {
    header: ExtensionHeader,
    data: ByteSequence<'a>,
}

impl<'a> ExtensionResult<'a> {
    /// Pair a header with its payload
    #[must_use]
    pub fn new(type_code: i8, data: ByteSequence<'a>) -> Self {
        let length = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self {
            header: ExtensionHeader::new(type_code, length),
            data,
        }
    }

    /// Extension header
    #[must_use]
    pub const fn header(&self) -> ExtensionHeader {
        self.header
    }

    /// Extension type code
    #[must_use]
    pub const fn type_code(&self) -> i8 {
        self.header.type_code
    }

    /// Payload bytes
    #[must_use]
    pub fn data(&self) -> &ByteSequence<'a> {
        &self.data
    }

    /// Consume the result, keeping only the payload
    #[must_use]
    pub fn into_data(self) -> ByteSequence<'a> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len() {
        assert_eq!(ExtensionHeader::new(1, 1).encoded_len(), 2);
        assert_eq!(ExtensionHeader::new(1, 16).encoded_len(), 2);
        assert_eq!(ExtensionHeader::new(1, 0).encoded_len(), 3);
        assert_eq!(ExtensionHeader::new(1, 3).encoded_len(), 3);
        assert_eq!(ExtensionHeader::new(1, 256).encoded_len(), 4);
        assert_eq!(ExtensionHeader::new(1, 70_000).encoded_len(), 6);
    }

    #[test]
    fn test_result_header_tracks_payload() {
        let payload = [1u8, 2, 3];
        let result = ExtensionResult::new(ExtensionTypeCode::IDENTIFIER, ByteSequence::new(&payload));
        assert_eq!(result.header(), ExtensionHeader::new(99, 3));
        assert_eq!(result.data().to_vec(), payload);
    }
}
