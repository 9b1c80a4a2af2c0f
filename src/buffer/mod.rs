//! Input sequences and the byte cursor

mod cursor;
mod sequence;

pub use cursor::{Position, SequenceReader};
pub use sequence::ByteSequence;
