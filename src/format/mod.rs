//! Wire format definitions shared by the reader and the writer
//!
//! This module provides the code table, extension headers, the timestamp
//! extension and the error type.

pub mod code;
mod error;
mod extension;
mod options;
mod timestamp;

pub use code::MessagePackType;
pub use error::{Error, Result};
pub use extension::{ExtensionHeader, ExtensionResult, ExtensionTypeCode};
pub use options::{DEFAULT_MAX_DEPTH, SecurityOptions};
pub use timestamp::Timestamp;

/// Largest header any string, binary or extension value can have (code + u32 length + type)
pub const MAX_HEADER_SIZE: usize = 6;

/// Largest string header (str32 code + u32 length)
pub const MAX_STRING_HEADER_SIZE: usize = 5;

/// Worst-case UTF-8 bytes produced per UTF-16 code unit
pub const MAX_UTF8_BYTES_PER_UTF16_UNIT: usize = 3;
