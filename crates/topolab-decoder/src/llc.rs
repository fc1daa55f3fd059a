//! IEEE 802.2 Logical-Link Control header.

use crate::layer::{lookup, Decoded, FieldTable, Protocol};
use crate::octets::Octets;

/// DSAP, SSAP, control.
pub const HEADER_LEN: usize = 3;

/// SAP of spanning tree BPDUs.
pub const STP_SAP: &str = "42";

const SAP_NAMES: &[(&str, &str)] = &[
    ("00", "NULL LSAP"),
    ("42", "Spanning Tree BPDU"),
    ("aa", "SNAP"),
    ("e0", "NetWare"),
    ("f0", "NetBIOS"),
    ("fe", "ISO Network Layer"),
];

fn sap(data: &Octets<'_>, index: usize) -> String {
    let key = data.key(index);
    match lookup(SAP_NAMES, key) {
        Some(name) => format!("{name} (0x{key})"),
        None => format!("0x{key}"),
    }
}

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < HEADER_LEN {
        tracing::trace!(len = data.len(), "llc header too short");
        return Decoded::malformed();
    }

    let mut fields = FieldTable::new();
    fields.push("DSAP:", sap(&data, 0));
    fields.push("SSAP:", sap(&data, 1));
    fields.push("Control Field:", data.hex(2..3));

    if data.key(0) == STP_SAP && data.key(1) == STP_SAP {
        return Decoded::then(fields, Protocol::SpanningTree, data.skip(HEADER_LEN));
    }
    Decoded::last(fields)
}
