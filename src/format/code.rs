//! MessagePack wire codes and type classification
//!
//! Every value on the wire starts with a single code byte. Fixed ranges carry
//! a small payload (value, count or length) inside the code itself; the
//! remaining codes are singletons followed by a fixed-width body or a
//! length-prefixed payload.

use std::fmt;

/// Lowest positive fixint code (`0x00`).
pub const MIN_FIX_INT: u8 = 0x00;
/// Highest positive fixint code (`0x7f`).
pub const MAX_FIX_INT: u8 = 0x7f;
/// Lowest fixmap code (`0x80`).
pub const MIN_FIX_MAP: u8 = 0x80;
/// Highest fixmap code (`0x8f`).
pub const MAX_FIX_MAP: u8 = 0x8f;
/// Lowest fixarray code (`0x90`).
pub const MIN_FIX_ARRAY: u8 = 0x90;
/// Highest fixarray code (`0x9f`).
pub const MAX_FIX_ARRAY: u8 = 0x9f;
/// Lowest fixstr code (`0xa0`).
pub const MIN_FIX_STR: u8 = 0xa0;
/// Highest fixstr code (`0xbf`).
pub const MAX_FIX_STR: u8 = 0xbf;
/// Nil.
pub const NIL: u8 = 0xc0;
/// Reserved by the format, never emitted.
pub const NEVER_USED: u8 = 0xc1;
/// Boolean false.
pub const FALSE: u8 = 0xc2;
/// Boolean true.
pub const TRUE: u8 = 0xc3;
/// Binary with 8-bit length.
pub const BIN8: u8 = 0xc4;
/// Binary with 16-bit length.
pub const BIN16: u8 = 0xc5;
/// Binary with 32-bit length.
pub const BIN32: u8 = 0xc6;
/// Extension with 8-bit length.
pub const EXT8: u8 = 0xc7;
/// Extension with 16-bit length.
pub const EXT16: u8 = 0xc8;
/// Extension with 32-bit length.
pub const EXT32: u8 = 0xc9;
/// IEEE 754 single precision float.
pub const FLOAT32: u8 = 0xca;
/// IEEE 754 double precision float.
pub const FLOAT64: u8 = 0xcb;
/// Unsigned 8-bit integer.
pub const UINT8: u8 = 0xcc;
/// Unsigned 16-bit integer.
pub const UINT16: u8 = 0xcd;
/// Unsigned 32-bit integer.
pub const UINT32: u8 = 0xce;
/// Unsigned 64-bit integer.
pub const UINT64: u8 = 0xcf;
/// Signed 8-bit integer.
pub const INT8: u8 = 0xd0;
/// Signed 16-bit integer.
pub const INT16: u8 = 0xd1;
/// Signed 32-bit integer.
pub const INT32: u8 = 0xd2;
/// Signed 64-bit integer.
pub const INT64: u8 = 0xd3;
/// Extension with a 1-byte payload.
pub const FIX_EXT1: u8 = 0xd4;
/// Extension with a 2-byte payload.
pub const FIX_EXT2: u8 = 0xd5;
/// Extension with a 4-byte payload.
pub const FIX_EXT4: u8 = 0xd6;
/// Extension with an 8-byte payload.
pub const FIX_EXT8: u8 = 0xd7;
/// Extension with a 16-byte payload.
pub const FIX_EXT16: u8 = 0xd8;
/// String with 8-bit length.
pub const STR8: u8 = 0xd9;
/// String with 16-bit length.
pub const STR16: u8 = 0xda;
/// String with 32-bit length.
pub const STR32: u8 = 0xdb;
/// Array with 16-bit count.
pub const ARRAY16: u8 = 0xdc;
/// Array with 32-bit count.
pub const ARRAY32: u8 = 0xdd;
/// Map with 16-bit count.
pub const MAP16: u8 = 0xde;
/// Map with 32-bit count.
pub const MAP32: u8 = 0xdf;
/// Lowest negative fixint code (`0xe0`, value -32).
pub const MIN_NEGATIVE_FIX_INT: u8 = 0xe0;
/// Highest negative fixint code (`0xff`, value -1).
pub const MAX_NEGATIVE_FIX_INT: u8 = 0xff;

/// Smallest value representable as a negative fixint.
pub const MIN_FIX_NEGATIVE_INT: i64 = -32;
/// Largest count carried inside a fixarray or fixmap code.
pub const MAX_FIX_COLLECTION_COUNT: u32 = 15;
/// Largest byte length carried inside a fixstr code.
pub const MAX_FIX_STRING_LENGTH: u32 = 31;

/// Broad category of a MessagePack value, derived from its leading code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessagePackType {
    /// Only `0xc1`, which the format never assigns.
    Unknown,
    /// Any signed or unsigned integer form.
    Integer,
    /// Nil.
    Nil,
    /// True or false.
    Boolean,
    /// float32 or float64.
    Float,
    /// UTF-8 string.
    String,
    /// Opaque binary blob.
    Binary,
    /// Array header.
    Array,
    /// Map header.
    Map,
    /// Extension header (fixext or ext8/16/32).
    Extension,
}

impl MessagePackType {
    /// Classify a leading code byte
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            MIN_FIX_INT..=MAX_FIX_INT | MIN_NEGATIVE_FIX_INT..=MAX_NEGATIVE_FIX_INT => {
                Self::Integer
            }
            MIN_FIX_MAP..=MAX_FIX_MAP | MAP16 | MAP32 => Self::Map,
            MIN_FIX_ARRAY..=MAX_FIX_ARRAY | ARRAY16 | ARRAY32 => Self::Array,
            MIN_FIX_STR..=MAX_FIX_STR | STR8 | STR16 | STR32 => Self::String,
            NIL => Self::Nil,
            FALSE | TRUE => Self::Boolean,
            BIN8 | BIN16 | BIN32 => Self::Binary,
            EXT8 | EXT16 | EXT32 | FIX_EXT1 | FIX_EXT2 | FIX_EXT4 | FIX_EXT8 | FIX_EXT16 => {
                Self::Extension
            }
            FLOAT32 | FLOAT64 => Self::Float,
            UINT8 | UINT16 | UINT32 | UINT64 | INT8 | INT16 | INT32 | INT64 => Self::Integer,
            NEVER_USED => Self::Unknown,
        }
    }
}

impl fmt::Display for MessagePackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Integer => "Integer",
            Self::Nil => "Nil",
            Self::Boolean => "Boolean",
            Self::Float => "Float",
            Self::String => "String",
            Self::Binary => "Binary",
            Self::Array => "Array",
            Self::Map => "Map",
            Self::Extension => "Extension",
        };
        write!(f, "{name}")
    }
}

/// Whether the code is a positive fixint
#[must_use]
pub const fn is_positive_fix_int(code: u8) -> bool {
    code <= MAX_FIX_INT
}

/// Whether the code is a negative fixint
#[must_use]
pub const fn is_negative_fix_int(code: u8) -> bool {
    code >= MIN_NEGATIVE_FIX_INT
}

/// Human-readable name of a code, for diagnostics
#[must_use]
pub fn name(code: u8) -> &'static str {
    match code {
        MIN_FIX_INT..=MAX_FIX_INT => "positive fixint",
        MIN_FIX_MAP..=MAX_FIX_MAP => "fixmap",
        MIN_FIX_ARRAY..=MAX_FIX_ARRAY => "fixarray",
        MIN_FIX_STR..=MAX_FIX_STR => "fixstr",
        NIL => "nil",
        NEVER_USED => "(never used)",
        FALSE => "false",
        TRUE => "true",
        BIN8 => "bin 8",
        BIN16 => "bin 16",
        BIN32 => "bin 32",
        EXT8 => "ext 8",
        EXT16 => "ext 16",
        EXT32 => "ext 32",
        FLOAT32 => "float 32",
        FLOAT64 => "float 64",
        UINT8 => "uint 8",
        UINT16 => "uint 16",
        UINT32 => "uint 32",
        UINT64 => "uint 64",
        INT8 => "int 8",
        INT16 => "int 16",
        INT32 => "int 32",
        INT64 => "int 64",
        FIX_EXT1 => "fixext 1",
        FIX_EXT2 => "fixext 2",
        FIX_EXT4 => "fixext 4",
        FIX_EXT8 => "fixext 8",
        FIX_EXT16 => "fixext 16",
        STR8 => "str 8",
        STR16 => "str 16",
        STR32 => "str 32",
        ARRAY16 => "array 16",
        ARRAY32 => "array 32",
        MAP16 => "map 16",
        MAP32 => "map 32",
        MIN_NEGATIVE_FIX_INT..=MAX_NEGATIVE_FIX_INT => "negative fixint",
    }
}
