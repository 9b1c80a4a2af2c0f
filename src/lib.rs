//! Tinyhand IO - MessagePack reader and writer
//!
//! This library encodes and decodes the MessagePack wire format, including
//! the timestamp extension and the compressed-array and identifier
//! extension codes. Decoding is zero-copy over input that may arrive split
//! across several buffers.
//!
//! # Quick Start
//!
//! ```rust
//! use tinyhand_io::{MessagePackReader, MessagePackWriter};
//!
//! // Encode [1, "ok", true, nil]
//! let mut writer = MessagePackWriter::new();
//! writer.write_array_header(4);
//! writer.write_i32(1);
//! writer.write_str("ok");
//! writer.write_bool(true);
//! writer.write_nil();
//! let bytes = writer.flush();
//! assert_eq!(bytes.as_ref(), [0x94, 0x01, 0xa2, 0x6f, 0x6b, 0xc3, 0xc0]);
//!
//! // Decode it again
//! let mut reader = MessagePackReader::new(&bytes);
//! assert_eq!(reader.read_array_header()?, 4);
//! assert_eq!(reader.read_u8()?, 1);
//! assert_eq!(reader.read_string()?.as_deref(), Some("ok"));
//! assert!(reader.read_bool()?);
//! assert!(reader.try_read_nil());
//! assert!(reader.is_end());
//! # Ok::<(), tinyhand_io::Error>(())
//! ```
//!
//! # Features
//!
//! - **Zero-copy reads** - strings, binary and extension payloads borrow from the input
//! - **Segmented input** - values may straddle buffer boundaries
//! - **Partial input** - `try_` reads report missing bytes without consuming anything
//! - **Compact writes** - integers and headers use the smallest encoding
//! - **Hostile input limits** - nesting depth and header counts are checked before use

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod buffer;
pub mod format;
pub mod reader;
pub mod writer;

pub use buffer::ByteSequence;
pub use format::{
    Error, ExtensionHeader, ExtensionResult, ExtensionTypeCode, MessagePackType, Result,
    SecurityOptions, Timestamp,
};
pub use reader::MessagePackReader;
pub use writer::MessagePackWriter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
