//! ARP over Ethernet/IPv4.

use crate::layer::{lookup, Decoded, FieldTable};
use crate::octets::Octets;

/// Fixed Ethernet/IPv4 ARP body.
pub const HEADER_LEN: usize = 28;

const HARDWARE_TYPES: &[(&str, &str)] = &[("0001", "Ethernet (1)")];

const PROTOCOL_TYPES: &[(&str, &str)] = &[("0800", "IPv4 (0x0800)")];

const OPCODES: &[(&str, &str)] = &[("0001", "request (1)"), ("0002", "reply (2)")];

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < HEADER_LEN {
        tracing::trace!(len = data.len(), "arp body too short");
        return Decoded::malformed();
    }

    let mut fields = FieldTable::new();
    fields.push(
        "Hardware type:",
        lookup(HARDWARE_TYPES, &data.joined(0..2))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown ({})", data.be(0..2))),
    );
    fields.push(
        "Protocol type:",
        lookup(PROTOCOL_TYPES, &data.joined(2..4))
            .map(str::to_string)
            .unwrap_or_else(|| data.hex(2..4)),
    );
    fields.push("Hardware size:", data.be(4..5).to_string());
    fields.push("Protocol size:", data.be(5..6).to_string());
    fields.push(
        "Opcode:",
        lookup(OPCODES, &data.joined(6..8))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown ({})", data.be(6..8))),
    );
    fields.push("Sender MAC address:", data.mac(8..14));
    fields.push("Sender IP address:", data.ipv4(14..18));
    fields.push("Target MAC address:", data.mac(18..24));
    fields.push("Target IP address:", data.ipv4(24..28));

    Decoded::last(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octets::HexStream;

    const REQUEST: &str = "00 01 08 00 06 04 00 01 \
                           00 11 22 33 44 55 c0 a8 01 0a \
                           00 00 00 00 00 00 c0 a8 01 01";

    #[test]
    fn request() {
        let s = HexStream::parse(REQUEST);
        let f = decode(s.octets()).fields;
        assert_eq!(f.get("Hardware type:"), Some("Ethernet (1)"));
        assert_eq!(f.get("Protocol type:"), Some("IPv4 (0x0800)"));
        assert_eq!(f.get("Hardware size:"), Some("6"));
        assert_eq!(f.get("Protocol size:"), Some("4"));
        assert_eq!(f.get("Opcode:"), Some("request (1)"));
        assert_eq!(f.get("Sender MAC address:"), Some("00:11:22:33:44:55"));
        assert_eq!(f.get("Sender IP address:"), Some("192.168.1.10"));
        assert_eq!(f.get("Target MAC address:"), Some("00:00:00:00:00:00"));
        assert_eq!(f.get("Target IP address:"), Some("192.168.1.1"));
    }

    #[test]
    fn reply_and_unknown_opcode() {
        let reply = REQUEST.replacen("06 04 00 01", "06 04 00 02", 1);
        let s = HexStream::parse(&reply);
        assert_eq!(decode(s.octets()).fields.get("Opcode:"), Some("reply (2)"));

        let odd = REQUEST.replacen("06 04 00 01", "06 04 00 09", 1);
        let s = HexStream::parse(&odd);
        assert_eq!(decode(s.octets()).fields.get("Opcode:"), Some("Unknown (9)"));
    }

    #[test]
    fn truncated_is_empty() {
        let s = HexStream::parse("00 01 08 00 06 04 00 01");
        assert!(decode(s.octets()).fields.is_empty());
    }
}
