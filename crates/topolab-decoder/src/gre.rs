//! GRE header.

use crate::layer::{lookup, Decoded, FieldTable, Protocol};
use crate::octets::Octets;

/// Flags/version and protocol type.
pub const BASE_LEN: usize = 4;

const CHECKSUM_FLAG: u16 = 1 << 15;
const KEY_FLAG: u16 = 1 << 13;
const SEQUENCE_FLAG: u16 = 1 << 12;

const CHECKSUM_LEN: usize = 8;
const KEY_LEN: usize = 4;
const SEQUENCE_LEN: usize = 4;

const PROTOCOL_TYPES: &[(&str, (&str, Option<Protocol>))] = &[
    ("0800", ("IP", Some(Protocol::Ipv4))),
    ("6558", ("Transparent Ethernet bridging", Some(Protocol::Ethernet))),
    ("86dd", ("IPv6", None)),
    ("8847", ("MPLS", None)),
];

/// Header length implied by the flags/version word.
pub fn gre_header_length(flags: u16) -> usize {
    [
        (CHECKSUM_FLAG, CHECKSUM_LEN),
        (KEY_FLAG, KEY_LEN),
        (SEQUENCE_FLAG, SEQUENCE_LEN),
    ]
    .iter()
    .fold(BASE_LEN, |len, (flag, extra)| {
        if flags & flag != 0 {
            len + extra
        } else {
            len
        }
    })
}

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < BASE_LEN {
        tracing::trace!(len = data.len(), "gre header too short");
        return Decoded::malformed();
    }

    let flags = data.be(0..2) as u16;
    let header_len = gre_header_length(flags);
    if data.len() < header_len {
        tracing::trace!(header_len, len = data.len(), "gre options truncated");
        return Decoded::malformed();
    }

    let type_key = data.joined(2..4);
    let proto = lookup(PROTOCOL_TYPES, &type_key);

    let mut fields = FieldTable::new();
    fields.push("Flags and Version:", data.hex(0..2));
    fields.push(
        "Protocol Type:",
        match proto {
            Some((name, _)) => format!("{name} (0x{type_key})"),
            None => format!("Unknown (0x{type_key})"),
        },
    );
    fields.push("Header Length:", header_len.to_string());

    let mut offset = BASE_LEN;
    if flags & CHECKSUM_FLAG != 0 {
        fields.push("Checksum:", data.hex(offset..offset + 2));
        offset += CHECKSUM_LEN;
    }
    if flags & KEY_FLAG != 0 {
        fields.push("Key:", data.hex(offset..offset + 4));
        offset += KEY_LEN;
    }
    if flags & SEQUENCE_FLAG != 0 {
        fields.push("Sequence Number:", data.be(offset..offset + 4).to_string());
    }

    match proto.and_then(|(_, next)| next) {
        Some(next) => Decoded::then(fields, next, data.skip(header_len)),
        None => Decoded::last(fields),
    }
}
