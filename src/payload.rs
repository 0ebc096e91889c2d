use crate::constants::{SIGNATURE_MAGIC, SIGNATURE_PAYLOAD_SIZE};
use crate::types::PayloadSize;
use rand::distr::Alphanumeric;
use rand::Rng;

/// Build the payload for a probe.
///
/// A requested size of `0` or exactly [`SIGNATURE_PAYLOAD_SIZE`] yields the
/// fixed signature token; any other size yields a pseudo-random printable
/// payload of exactly that length, which defeats intermediate caching or
/// rewriting and allows tampering to be detected on the reply.
pub(crate) fn make_payload(size: PayloadSize) -> Vec<u8> {
    if size.0 == 0 || size.0 == SIGNATURE_PAYLOAD_SIZE {
        signature_payload()
    } else {
        random_payload(usize::from(size))
    }
}

/// The fixed printable ASCII token embedding a versioned marker.
fn signature_payload() -> Vec<u8> {
    format!(
        "pingmon_{}_0x{:08X}_x1",
        env!("CARGO_PKG_VERSION"),
        SIGNATURE_MAGIC
    )
    .into_bytes()
}

fn random_payload(len: usize) -> Vec<u8> {
    rand::rng().sample_iter(Alphanumeric).take(len).collect()
}
