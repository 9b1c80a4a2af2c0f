//! Skipping and raw capture of whole values

use smallvec::SmallVec;
use tracing::trace;

use super::MessagePackReader;
use crate::buffer::ByteSequence;
use crate::format::code::{
    ARRAY16, ARRAY32, BIN8, BIN16, BIN32, EXT8, EXT16, EXT32, FALSE, FIX_EXT1, FIX_EXT2, FIX_EXT4,
    FIX_EXT8, FIX_EXT16, FLOAT32, FLOAT64, INT8, INT16, INT32, INT64, MAP16, MAP32, MAX_FIX_ARRAY,
    MAX_FIX_INT, MAX_FIX_MAP, MAX_FIX_STR, MIN_FIX_ARRAY, MIN_FIX_MAP, MIN_FIX_STR,
    MIN_NEGATIVE_FIX_INT, NEVER_USED, NIL, STR8, STR16, STR32, TRUE, UINT8, UINT16, UINT32, UINT64,
};
use crate::format::{Error, Result};

impl<'a> MessagePackReader<'a> {
    /// Advance past exactly one value of any type
    ///
    /// Arrays and maps are walked without recursion. Each nesting level takes
    /// one [`Self::depth_step`], so the depth limit is the only bound, and
    /// cancellation is checked once per element.
    pub fn skip(&mut self) -> Result<()> {
        self.transact(Self::skip_value)
    }

    /// Like [`Self::skip`], reporting any failure as `false` with the cursor unmoved
    pub fn try_skip(&mut self) -> bool {
        self.transact(Self::skip_value).is_ok()
    }

    /// Exact bytes of the next value, uninterpreted
    pub fn read_raw(&mut self) -> Result<ByteSequence<'a>> {
        let start = self.position();
        self.skip()?;
        Ok(self.cursor.slice_since(start))
    }

    /// The next `len` bytes, uninterpreted
    pub fn read_raw_len(&mut self, len: usize) -> Result<ByteSequence<'a>> {
        self.cursor.try_take(len).ok_or(Error::InsufficientBuffer)
    }

    fn skip_value(&mut self) -> Result<()> {
        // Elements still to skip in each enclosing collection, innermost last
        let mut enclosing: SmallVec<[u64; 16]> = SmallVec::new();
        let mut left: u64 = 1;
        loop {
            while left == 0 {
                let Some(outer) = enclosing.pop() else {
                    return Ok(());
                };
                self.depth_unstep();
                left = outer;
            }
            left -= 1;
            if !enclosing.is_empty() {
                self.check_cancelled()?;
            }
            if let Some(count) = self.skip_header()? {
                if count > self.remaining() as u64 {
                    return Err(Error::InsufficientBuffer);
                }
                self.depth_step()?;
                if count > 0 {
                    trace!(count, depth = self.depth, "skipping collection");
                }
                enclosing.push(left);
                left = count;
            }
        }
    }

    /// Consume one header, and the body for anything but a collection
    ///
    /// Returns the number of values an array or map header announces.
    fn skip_header(&mut self) -> Result<Option<u64>> {
        let body = match self.read_code()? {
            0..=MAX_FIX_INT | MIN_NEGATIVE_FIX_INT..=u8::MAX | NIL | TRUE | FALSE => 0,
            UINT8 | INT8 => 1,
            UINT16 | INT16 => 2,
            UINT32 | INT32 | FLOAT32 => 4,
            UINT64 | INT64 | FLOAT64 => 8,
            code @ MIN_FIX_STR..=MAX_FIX_STR => usize::from(code - MIN_FIX_STR),
            STR8 | BIN8 => usize::from(self.read_array::<1>()?[0]),
            STR16 | BIN16 => usize::from(self.read_be_u16()?),
            STR32 | BIN32 => self.read_be_u32()? as usize,
            // extension type byte plus payload
            FIX_EXT1 => 2,
            FIX_EXT2 => 3,
            FIX_EXT4 => 5,
            FIX_EXT8 => 9,
            FIX_EXT16 => 17,
            EXT8 => usize::from(self.read_array::<1>()?[0]) + 1,
            EXT16 => usize::from(self.read_be_u16()?) + 1,
            EXT32 => self.read_be_u32()? as usize + 1,
            code @ MIN_FIX_ARRAY..=MAX_FIX_ARRAY => return Ok(Some(u64::from(code & 0x0f))),
            ARRAY16 => {
                let count = self.read_be_u16()?;
                return Ok(Some(u64::from(count)));
            }
            ARRAY32 => {
                let count = self.read_be_u32()?;
                return Ok(Some(u64::from(count)));
            }
            // a map holds a key and a value per entry
            code @ MIN_FIX_MAP..=MAX_FIX_MAP => return Ok(Some(u64::from(code & 0x0f) * 2)),
            MAP16 => {
                let count = self.read_be_u16()?;
                return Ok(Some(u64::from(count) * 2));
            }
            MAP32 => {
                let count = self.read_be_u32()?;
                return Ok(Some(u64::from(count) * 2));
            }
            NEVER_USED => return Err(Error::InvalidCode(NEVER_USED)),
        };
        if self.cursor.try_advance(body) {
            Ok(None)
        } else {
            Err(Error::InsufficientBuffer)
        }
    }
}
