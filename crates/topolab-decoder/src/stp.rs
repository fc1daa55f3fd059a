//! Spanning tree BPDUs (802.1D, 802.1w, 802.1s).
//!
//! STP, RSTP and MSTP share the configuration BPDU layout. MSTP appends
//! version 1 and version 3 length fields; the MSTI records after them are not
//! decoded.

use crate::layer::{lookup, Decoded, FieldTable};
use crate::octets::Octets;

/// Protocol id, version, type, flags.
pub const TCN_LEN: usize = 4;

/// Full configuration BPDU through forward delay.
pub const CONFIG_LEN: usize = 35;

const PROTOCOL_ID: &str = "0000";

const TCN_TYPE: &str = "80";

const VERSIONS: &[(&str, &str)] = &[
    ("00", "Spanning Tree (0)"),
    ("02", "Rapid Spanning Tree (2)"),
    ("03", "Multiple Spanning Tree (3)"),
];

const BPDU_TYPES: &[(&str, &str)] = &[
    ("00", "Configuration (0x00)"),
    ("02", "RST BPDU (0x02)"),
    ("80", "Topology Change Notification (0x80)"),
];

const FLAGS: &[(&str, &str)] = &[("00", "0x00"), ("01", "0x01 (Topology Change)")];

const RSTP_VERSION: &str = "02";
const MSTP_VERSION: &str = "03";

/// Bridge identifier at `offset`: priority, system id extension, system id.
fn bridge_id(fields: &mut FieldTable, data: &Octets<'_>, offset: usize, prefix: &str) {
    let high = data.byte(offset);
    let priority = u32::from(high >> 4) * 4096;
    let extension = (u32::from(high & 0x0f) << 8) | u32::from(data.byte(offset + 1));
    fields.push(format!("{prefix} Priority:"), priority.to_string());
    fields.push(format!("{prefix} System ID Extension:"), extension.to_string());
    fields.push(format!("{prefix} System ID:"), data.mac(offset + 2..offset + 8));
}

/// Timer in 1/256 second units.
fn timer(data: &Octets<'_>, offset: usize) -> String {
    let seconds = data.be(offset..offset + 2) as f64 / 256.0;
    seconds.to_string()
}

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < TCN_LEN || data.joined(0..2) != PROTOCOL_ID {
        tracing::trace!(len = data.len(), "not a spanning tree bpdu");
        return Decoded::malformed();
    }

    let version = data.key(2);
    let bpdu_type = data.key(3);
    if bpdu_type != TCN_TYPE && data.len() < CONFIG_LEN {
        tracing::trace!(len = data.len(), "configuration bpdu too short");
        return Decoded::malformed();
    }

    let mut fields = FieldTable::new();
    fields.push("Protocol Identifier:", "Spanning Tree Protocol (0x0000)");
    fields.push(
        "Protocol Version Identifier:",
        lookup(VERSIONS, version)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown ({})", data.byte(2))),
    );

    let type_name = match (bpdu_type, version) {
        ("02", MSTP_VERSION) => "MST BPDU (0x02)".to_string(),
        _ => lookup(BPDU_TYPES, bpdu_type)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown (0x{bpdu_type})")),
    };
    fields.push("BPDU Type:", type_name);

    if bpdu_type == TCN_TYPE {
        return Decoded::last(fields);
    }

    let flags = data.key(4);
    fields.push(
        "BPDU flags:",
        lookup(FLAGS, flags)
            .map(str::to_string)
            .unwrap_or_else(|| format!("0x{flags}")),
    );

    bridge_id(&mut fields, &data, 5, "Root Bridge");
    fields.push("Root Path Cost:", data.be(13..17).to_string());
    bridge_id(&mut fields, &data, 17, "Bridge");
    fields.push("Port Identifier:", data.hex(25..27));
    fields.push("Message Age:", timer(&data, 27));
    fields.push("Max Age:", timer(&data, 29));
    fields.push("Hello Time:", timer(&data, 31));
    fields.push("Forward Delay:", timer(&data, 33));

    if (version == RSTP_VERSION || version == MSTP_VERSION) && data.len() > CONFIG_LEN {
        fields.push("Version 1 Length:", data.be(35..36).to_string());
    }
    if version == MSTP_VERSION && data.len() >= CONFIG_LEN + 3 {
        fields.push("Version 3 Length:", data.be(36..38).to_string());
    }

    Decoded::last(fields)
}
