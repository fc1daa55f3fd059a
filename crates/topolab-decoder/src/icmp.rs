//! ICMPv4 messages.

use crate::layer::{lookup, Decoded, FieldTable};
use crate::octets::Octets;

/// Type, code, checksum.
pub const BASE_LEN: usize = 4;

/// Base plus the four message-specific octets.
pub const FULL_LEN: usize = 8;

const UNREACHABLE_CODES: &[(&str, &str)] = &[
    ("00", "Network unreachable"),
    ("01", "Host unreachable"),
    ("03", "Port unreachable"),
    ("04", "Fragmentation needed and DF set"),
];

const REDIRECT_CODES: &[(&str, &str)] = &[
    ("00", "Redirect for network"),
    ("01", "Redirect for host"),
    ("02", "Redirect for TOS and network"),
    ("03", "Redirect for TOS and host"),
];

const TIME_EXCEEDED_CODES: &[(&str, &str)] = &[
    ("00", "Time to live exceeded in transit"),
    ("01", "Fragment reassembly time exceeded"),
];

fn code(data: &Octets<'_>, table: &[(&str, &str)]) -> String {
    let value = data.byte(1);
    match lookup(table, data.key(1)) {
        Some(name) => format!("{value} ({name})"),
        None => value.to_string(),
    }
}

fn echo(data: &Octets<'_>, fields: &mut FieldTable, name: &str) -> bool {
    if data.len() < FULL_LEN {
        return false;
    }
    fields.push("Type:", format!("{} ({name})", data.byte(0)));
    fields.push("Code:", data.byte(1).to_string());
    fields.push("Checksum:", data.hex(2..4));
    fields.push(
        "Identifier:",
        format!("{} ({})", data.hex(4..6), data.be(4..6)),
    );
    fields.push(
        "Sequence Number:",
        format!("{} ({})", data.be(6..8), data.hex(6..8)),
    );
    true
}

fn coded(
    data: &Octets<'_>,
    fields: &mut FieldTable,
    name: &str,
    codes: &[(&str, &str)],
) {
    fields.push("Type:", format!("{} ({name})", data.byte(0)));
    fields.push("Code:", code(data, codes));
    fields.push("Checksum:", data.hex(2..4));
}

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < BASE_LEN {
        tracing::trace!(len = data.len(), "icmp header too short");
        return Decoded::malformed();
    }

    let mut fields = FieldTable::new();
    let decoded = match data.key(0) {
        "08" => echo(&data, &mut fields, "Echo (ping) request"),
        "00" => echo(&data, &mut fields, "Echo (ping) reply"),
        "03" => {
            coded(&data, &mut fields, "Destination unreachable", UNREACHABLE_CODES);
            true
        }
        "05" => {
            coded(&data, &mut fields, "Redirect", REDIRECT_CODES);
            if data.len() >= FULL_LEN {
                fields.push("Gateway Address:", data.ipv4(4..8));
            }
            true
        }
        "0b" => {
            coded(&data, &mut fields, "Time-to-live exceeded", TIME_EXCEEDED_CODES);
            true
        }
        other => {
            tracing::trace!(icmp_type = other, "unsupported icmp type");
            false
        }
    };

    if decoded {
        Decoded::last(fields)
    } else {
        Decoded::malformed()
    }
}
