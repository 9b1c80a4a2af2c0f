//! MessagePack timestamp extension (type -1)
//!
//! # Layouts
//!
//! ```text
//! timestamp 32 : [seconds u32]                              seconds in [0, 2^32)
//! timestamp 64 : [nanoseconds:30 | seconds:34]  (u64)       seconds in [0, 2^34)
//! timestamp 96 : [nanoseconds u32] [seconds i64]            any instant
//! ```

use bytes::BufMut;
use chrono::{DateTime, Utc};

use super::{Error, ExtensionTypeCode, Result};

const NANOSECONDS_PER_SECOND: u32 = 1_000_000_000;
const SECONDS_34_BIT_MASK: u64 = 0x0000_0003_ffff_ffff;

/// Seconds and nanoseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: u32,
}

impl Timestamp {
    /// The Unix epoch
    pub const UNIX_EPOCH: Self = Self {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Create a timestamp, carrying whole seconds out of `nanoseconds`
    ///
    /// The carry saturates at `i64::MAX` seconds.
    #[must_use]
    pub const fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds: seconds.saturating_add((nanoseconds / NANOSECONDS_PER_SECOND) as i64),
            nanoseconds: nanoseconds % NANOSECONDS_PER_SECOND,
        }
    }

    /// Build from decoded fields, rejecting a nanosecond field of a second or more
    fn from_wire(seconds: i64, nanoseconds: u32) -> Result<Self> {
        if nanoseconds >= NANOSECONDS_PER_SECOND {
            return Err(Error::InvalidTimestamp(format!(
                "nanoseconds {nanoseconds} out of range"
            )));
        }
        Ok(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Whole seconds since the epoch
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Sub-second part, always below one billion
    #[must_use]
    pub const fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// Payload length of the most compact layout for this instant
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        if self.seconds >= 0 && (self.seconds as u64) >> 34 == 0 {
            if self.nanoseconds == 0 && self.seconds <= u32::MAX as i64 {
                4
            } else {
                8
            }
        } else {
            12
        }
    }

    /// Append the most compact payload layout to `out`
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn encode_into<B: BufMut>(&self, out: &mut B) {
        match self.encoded_len() {
            4 => out.put_u32(self.seconds as u32),
            8 => out.put_u64((u64::from(self.nanoseconds) << 34) | self.seconds as u64),
            _ => {
                out.put_u32(self.nanoseconds);
                out.put_i64(self.seconds);
            }
        }
    }

    /// Decode one of the three payload layouts
    ///
    /// Fails with [`Error::InvalidTimestamp`] when the nanosecond field is
    /// 1,000,000,000 or more.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        match *payload {
            [a, b, c, d] => Ok(Self::new(i64::from(u32::from_be_bytes([a, b, c, d])), 0)),
            [a, b, c, d, e, f, g, h] => {
                let packed = u64::from_be_bytes([a, b, c, d, e, f, g, h]);
                let nanoseconds = (packed >> 34) as u32;
                #[allow(clippy::cast_possible_wrap)]
                let seconds = (packed & SECONDS_34_BIT_MASK) as i64;
                Self::from_wire(seconds, nanoseconds)
            }
            [a, b, c, d, ref rest @ ..] if rest.len() == 8 => {
                let nanoseconds = u32::from_be_bytes([a, b, c, d]);
                let mut seconds = [0u8; 8];
                seconds.copy_from_slice(rest);
                Self::from_wire(i64::from_be_bytes(seconds), nanoseconds)
            }
            _ => Err(Error::MalformedExtension {
                type_code: ExtensionTypeCode::TIMESTAMP,
                length: u32::try_from(payload.len()).unwrap_or(u32::MAX),
            }),
        }
    }

    /// Convert to a UTC date-time, failing when outside chrono's range
    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds).ok_or_else(|| {
            Error::InvalidTimestamp(format!("{}s {}ns", self.seconds, self.nanoseconds))
        })
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        // chrono reports leap seconds as nanoseconds >= 1e9; clamp into the second
        let nanoseconds = value.timestamp_subsec_nanos().min(NANOSECONDS_PER_SECOND - 1);
        Self {
            seconds: value.timestamp(),
            nanoseconds,
        }
    }
}
