//! Ethernet II / IEEE 802.3 header.

use crate::layer::{lookup, Decoded, FieldTable, Protocol};
use crate::octets::Octets;

/// Destination, source, type/length.
pub const HEADER_LEN: usize = 14;

/// Type/length values below this are 802.3 payload lengths.
pub const MAX_8023_LENGTH: u64 = 1500;

const ETHER_TYPES: &[(&str, (&str, Protocol))] = &[
    ("0806", ("ARP (0x0806)", Protocol::Arp)),
    ("0800", ("IPv4 (0x0800)", Protocol::Ipv4)),
];

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < HEADER_LEN {
        tracing::trace!(len = data.len(), "ethernet header too short");
        return Decoded::malformed();
    }

    let mut fields = FieldTable::new();
    fields.push("Destination:", data.mac(0..6));
    fields.push("Source:", data.mac(6..12));

    let payload = data.skip(HEADER_LEN);
    let type_length = data.be(12..14);
    if type_length < MAX_8023_LENGTH {
        fields.push("Type:", format!("{type_length} bytes"));
        return Decoded::then(fields, Protocol::Llc, payload);
    }

    match lookup(ETHER_TYPES, &data.joined(12..14)) {
        Some((name, next)) => {
            fields.push("Type:", name);
            Decoded::then(fields, next, payload)
        }
        None => {
            fields.push("Type:", "");
            Decoded::last(fields)
        }
    }
}
