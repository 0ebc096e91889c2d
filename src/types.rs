use derive_more::{Add, AddAssign};
use std::num::NonZeroUsize;

/// `PayloadSize` newtype.
///
/// The requested echo payload size in bytes.  The values `0` and
/// [`SIGNATURE_PAYLOAD_SIZE`](crate::constants::SIGNATURE_PAYLOAD_SIZE)
/// select the default signature payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct PayloadSize(pub u16);

/// `SessionId` newtype.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd)]
pub struct SessionId(pub u16);

/// `MaxProbes` newtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd)]
pub struct MaxProbes(pub NonZeroUsize);

/// `ProbeSeq` newtype.
///
/// The ordinal of a probe within a session, counted from the first tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Ord, PartialOrd, Add, AddAssign)]
pub struct ProbeSeq(pub u64);

impl From<PayloadSize> for usize {
    fn from(size: PayloadSize) -> Self {
        Self::from(size.0)
    }
}
