//! Borrowed, possibly multi-segment byte sequence.

use std::fmt;

use smallvec::SmallVec;

/// Immutable view over one or more borrowed byte segments.
///
/// Empty segments are dropped on construction, so every stored segment holds
/// at least one byte. Sub-slices are themselves `ByteSequence`s and never copy
/// the underlying bytes.
#[derive(Clone, Default)]
pub struct ByteSequence<'a> {
    segments: SmallVec<[&'a [u8]; 2]>,
    len: usize,
}

impl<'a> ByteSequence<'a> {
    /// View over a single contiguous slice.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::from_segments([bytes])
    }

    /// View over several slices, read in order.
    pub fn from_segments<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let segments: SmallVec<[&'a [u8]; 2]> =
            segments.into_iter().filter(|s| !s.is_empty()).collect();
        let len = segments.iter().map(|s| s.len()).sum();
        Self { segments, len }
    }

    /// Total length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Whether every byte lies in one contiguous slice.
    #[must_use]
    pub fn is_single_segment(&self) -> bool {
        self.segments.len() <= 1
    }

    /// Iterate over the segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.segments.iter().copied()
    }

    /// Iterate over every byte.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.segments.iter().flat_map(|s| s.iter().copied())
    }

    /// First segment, or an empty slice.
    #[must_use]
    pub fn first_span(&self) -> &'a [u8] {
        self.segments.first().copied().unwrap_or_default()
    }

    /// The whole sequence as one slice, when it is contiguous.
    #[must_use]
    pub fn as_contiguous(&self) -> Option<&'a [u8]> {
        match self.segments.as_slice() {
            [] => Some(&[]),
            [single] => Some(single),
            _ => None,
        }
    }

    /// Copy every byte into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        self.extend_vec(&mut out);
        out
    }

    /// Append every byte to `out`.
    pub fn extend_vec(&self, out: &mut Vec<u8>) {
        for segment in &self.segments {
            out.extend_from_slice(segment);
        }
    }

    /// Zero-copy sub-sequence of `len` bytes starting at byte `start`.
    #[must_use]
    pub fn slice(&self, start: usize, len: usize) -> Option<Self> {
        if start.checked_add(len)? > self.len {
            return None;
        }
        let mut skipped = 0;
        for (index, segment) in self.segments.iter().enumerate() {
            if start < skipped + segment.len() {
                return Some(self.slice_at(index, start - skipped, len));
            }
            skipped += segment.len();
        }
        Some(Self::default())
    }

    pub(crate) fn segment(&self, index: usize) -> &'a [u8] {
        self.segments.get(index).copied().unwrap_or_default()
    }

    /// Sub-sequence starting at `offset` within segment `index`.
    ///
    /// The caller guarantees that `len` bytes are available from there.
    pub(crate) fn slice_at(&self, index: usize, offset: usize, len: usize) -> Self {
        let mut segments = SmallVec::new();
        let mut left = len;
        let mut index = index;
        let mut offset = offset;
        while left > 0 {
            let available = &self.segment(index)[offset..];
            debug_assert!(!available.is_empty(), "slice past end of sequence");
            if available.is_empty() {
                break;
            }
            let take = left.min(available.len());
            segments.push(&available[..take]);
            left -= take;
            index += 1;
            offset = 0;
        }
        Self {
            segments,
            len: len - left,
        }
    }
}

impl fmt::Debug for ByteSequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSequence")
            .field("len", &self.len)
            .field("segments", &self.segments.len())
            .finish()
    }
}

impl PartialEq for ByteSequence<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.bytes().eq(other.bytes())
    }
}

impl Eq for ByteSequence<'_> {}

impl PartialEq<[u8]> for ByteSequence<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.len == other.len() && self.bytes().eq(other.iter().copied())
    }
}

impl PartialEq<&[u8]> for ByteSequence<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        *self == **other
    }
}

impl<'a> From<&'a [u8]> for ByteSequence<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ByteSequence<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::new(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for ByteSequence<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl<'a> From<&'a bytes::Bytes> for ByteSequence<'a> {
    fn from(bytes: &'a bytes::Bytes) -> Self {
        Self::new(bytes)
    }
}
