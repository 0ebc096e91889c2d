/// The maximum echo payload size in bytes.
pub const MAX_PAYLOAD_SIZE: u16 = 65500;

/// The reserved payload size which selects the signature payload.
///
/// A request for exactly this size is treated the same as a request for the
/// default size and yields the signature token rather than a random payload
/// of this length.
pub const SIGNATURE_PAYLOAD_SIZE: u16 = 32;

/// The magic marker embedded in the signature payload.
pub(crate) const SIGNATURE_MAGIC: u32 = 0x5049_4E47;
