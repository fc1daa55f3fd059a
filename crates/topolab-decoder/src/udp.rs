//! UDP header.

use crate::layer::{Decoded, FieldTable};
use crate::octets::Octets;

pub const HEADER_LEN: usize = 8;

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < HEADER_LEN {
        tracing::trace!(len = data.len(), "udp header too short");
        return Decoded::malformed();
    }

    let mut fields = FieldTable::new();
    fields.push("Source Port:", data.be(0..2).to_string());
    fields.push("Destination Port:", data.be(2..4).to_string());
    fields.push("Length:", data.be(4..6).to_string());
    fields.push("Checksum:", data.hex(6..8));

    Decoded::last(fields)
}
