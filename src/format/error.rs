//! Codec error types

use thiserror::Error;

use super::code::{self, MessagePackType};

/// Errors raised while decoding MessagePack data
///
/// The writer never produces these; it only fails when its buffer cannot grow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input ended before the value (or its declared length) was complete.
    ///
    /// Recoverable for streaming callers: retry from the start of the value
    /// once more bytes have arrived.
    #[error("insufficient buffer: the input ended before the value was complete")]
    InsufficientBuffer,

    /// The leading code does not belong to the requested category
    #[error(
        "unexpected code {code:#04x} ({name}): expected {expected}, got {actual}",
        name = code_name(.code)
    )]
    UnexpectedCode {
        /// Code found at the cursor
        code: u8,
        /// Category the caller asked for
        expected: MessagePackType,
        /// Category of the code found
        actual: MessagePackType,
    },

    /// The never-used code `0xc1` was encountered
    #[error("invalid code {0:#04x}")]
    InvalidCode(u8),

    /// The decoded value does not fit the requested width
    #[error("numeric overflow: value does not fit in {target}")]
    NumericOverflow {
        /// Name of the requested output type
        target: &'static str,
    },

    /// An extension payload has a length its type does not allow
    #[error("malformed extension: type {type_code} with invalid length {length}")]
    MalformedExtension {
        /// Extension type code
        type_code: i8,
        /// Declared payload length
        length: u32,
    },

    /// An extension carried a type code other than the one requested
    #[error("unexpected extension type: expected {expected}, got {actual}")]
    UnexpectedExtensionType {
        /// Type code the caller asked for
        expected: i8,
        /// Type code found
        actual: i8,
    },

    /// A string payload is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A timestamp string token could not be parsed
    #[error("invalid timestamp string: {0:?}")]
    InvalidTimestamp(String),

    /// Nesting exceeded the configured maximum depth
    #[error("maximum nesting depth of {max} exceeded")]
    DepthExceeded {
        /// Configured limit
        max: usize,
    },

    /// The operation was cancelled through the cursor's cancellation token
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Build an [`Error::UnexpectedCode`] from the offending code
    #[must_use]
    pub fn unexpected(code: u8, expected: MessagePackType) -> Self {
        let actual = MessagePackType::from_code(code);
        if actual == MessagePackType::Unknown {
            return Self::InvalidCode(code);
        }
        Self::UnexpectedCode {
            code,
            expected,
            actual,
        }
    }

    /// Whether retrying with more input could succeed
    #[must_use]
    pub const fn is_insufficient_buffer(&self) -> bool {
        matches!(self, Self::InsufficientBuffer)
    }
}

fn code_name(code: &u8) -> &'static str {
    code::name(*code)
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
