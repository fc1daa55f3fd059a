//! TCP header.

use crate::layer::{Decoded, FieldTable};
use crate::octets::Octets;

/// Header without options.
pub const MIN_HEADER_LEN: usize = 20;

const FLAG_NAMES: [(u8, &str); 8] = [
    (0x01, "FIN"),
    (0x02, "SYN"),
    (0x04, "RST"),
    (0x08, "PSH"),
    (0x10, "ACK"),
    (0x20, "URG"),
    (0x40, "ECE"),
    (0x80, "CWR"),
];

fn flags_text(data: &Octets<'_>) -> String {
    let flags = data.byte(13);
    let names: Vec<&str> = FLAG_NAMES
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        data.hex(13..14)
    } else {
        format!("{} ({})", data.hex(13..14), names.join(", "))
    }
}

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < MIN_HEADER_LEN {
        tracing::trace!(len = data.len(), "tcp header too short");
        return Decoded::malformed();
    }

    let offset = data.byte(12) >> 4;
    let mut fields = FieldTable::new();
    fields.push("Source Port:", data.be(0..2).to_string());
    fields.push("Destination Port:", data.be(2..4).to_string());
    fields.push("Sequence Number:", data.be(4..8).to_string());
    fields.push("Acknowledgment Number:", data.be(8..12).to_string());
    fields.push(
        "Header Length:",
        format!("{} bytes ({offset})", u32::from(offset) * 4),
    );
    fields.push("Flags:", flags_text(&data));
    fields.push("Window:", data.be(14..16).to_string());
    fields.push("Checksum:", data.hex(16..18));
    fields.push("Urgent Pointer:", data.be(18..20).to_string());

    Decoded::last(fields)
}
