//! Read cursor over a [`ByteSequence`].

use super::ByteSequence;

/// Location of a [`SequenceReader`] within its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    segment: usize,
    offset: usize,
    consumed: usize,
}

impl Position {
    /// Bytes consumed from the start of the sequence.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }
}

/// Forward-only cursor over a borrowed byte sequence.
///
/// Invariant: `position.offset` is inside segment `position.segment` unless
/// the cursor is at the end, where `segment == segment_count` and `offset == 0`.
#[derive(Debug, Clone)]
pub struct SequenceReader<'a> {
    sequence: ByteSequence<'a>,
    position: Position,
}

impl<'a> SequenceReader<'a> {
    /// Cursor at the start of `sequence`.
    #[must_use]
    pub fn new(sequence: ByteSequence<'a>) -> Self {
        Self {
            sequence,
            position: Position::default(),
        }
    }

    /// The complete underlying sequence.
    #[must_use]
    pub fn sequence(&self) -> &ByteSequence<'a> {
        &self.sequence
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.position.consumed
    }

    /// Bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.sequence.len() - self.position.consumed
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Move back to a position previously returned by [`Self::position`].
    pub fn rewind(&mut self, position: Position) {
        debug_assert!(position.consumed <= self.sequence.len());
        self.position = position;
    }

    /// Unread part of the current segment.
    #[must_use]
    pub fn current_span(&self) -> &'a [u8] {
        let segment = self.sequence.segment(self.position.segment);
        segment.get(self.position.offset..).unwrap_or_default()
    }

    /// Next byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.current_span().first().copied()
    }

    /// Advance by `count` bytes if that many remain.
    pub fn try_advance(&mut self, count: usize) -> bool {
        if count > self.remaining() {
            return false;
        }
        self.advance(count);
        true
    }

    fn advance(&mut self, mut count: usize) {
        while count > 0 {
            let available = self.current_span().len();
            if count < available {
                self.position.offset += count;
                self.position.consumed += count;
                return;
            }
            count -= available;
            self.position.consumed += available;
            self.position.segment += 1;
            self.position.offset = 0;
        }
    }

    /// Consume one byte.
    pub fn try_read(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.advance(1);
        Some(byte)
    }

    /// Consume exactly `N` bytes, copying across segment boundaries if needed.
    pub fn try_read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        if let Some(span) = self.current_span().get(..N) {
            out.copy_from_slice(span);
        } else {
            if self.remaining() < N {
                return None;
            }
            let copied = self.sequence.slice_at(self.position.segment, self.position.offset, N);
            let mut filled = 0;
            for segment in copied.segments() {
                out[filled..filled + segment.len()].copy_from_slice(segment);
                filled += segment.len();
            }
        }
        self.advance(N);
        Some(out)
    }

    /// Consume `len` bytes as a zero-copy sub-sequence.
    pub fn try_take(&mut self, len: usize) -> Option<ByteSequence<'a>> {
        if len > self.remaining() {
            return None;
        }
        let taken = self.sequence.slice_at(self.position.segment, self.position.offset, len);
        self.advance(len);
        Some(taken)
    }

    /// Consume `len` bytes only if they lie in the current segment.
    pub fn try_take_contiguous(&mut self, len: usize) -> Option<&'a [u8]> {
        let span = self.current_span().get(..len)?;
        self.advance(len);
        Some(span)
    }

    /// Bytes between `start` and the current position.
    #[must_use]
    pub fn slice_since(&self, start: Position) -> ByteSequence<'a> {
        let len = self.position.consumed - start.consumed;
        self.sequence.slice_at(start.segment, start.offset, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEGMENTS: [&[u8]; 3] = [&[1, 2], &[3, 4, 5], &[6]];

    fn split() -> ByteSequence<'static> {
        ByteSequence::from_segments(SEGMENTS)
    }

    #[test]
    fn test_read_across_segments() {
        let mut reader = SequenceReader::new(split());
        assert_eq!(reader.try_read(), Some(1));
        assert_eq!(reader.try_read_array::<4>(), Some([2, 3, 4, 5]));
        assert_eq!(reader.current_span(), &[6]);
        assert_eq!(reader.try_read_array::<2>(), None);
        assert_eq!(reader.consumed(), 5);
        assert_eq!(reader.try_read(), Some(6));
        assert!(reader.is_end());
        assert_eq!(reader.peek(), None);
    }

    #[test]
    fn test_take_and_rewind() {
        let mut reader = SequenceReader::new(split());
        let start = reader.position();
        let taken = reader.try_take(4).unwrap();
        assert_eq!(taken.to_vec(), [1, 2, 3, 4]);
        assert_eq!(reader.slice_since(start), taken);
        assert!(reader.try_take(3).is_none());
        assert_eq!(reader.remaining(), 2);

        reader.rewind(start);
        assert_eq!(reader.remaining(), 6);
        assert!(reader.try_take_contiguous(3).is_none());
        assert_eq!(reader.try_take_contiguous(2), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_advance_exact_segment_end() {
        let mut reader = SequenceReader::new(split());
        assert!(reader.try_advance(2));
        assert_eq!(reader.peek(), Some(3));
        assert!(!reader.try_advance(5));
        assert!(reader.try_advance(4));
        assert!(reader.is_end());
        assert_eq!(reader.current_span(), &[] as &[u8]);
    }
}
