//! IPv4 header.

use crate::layer::{lookup, Decoded, FieldTable, Protocol};
use crate::octets::Octets;

/// Header without options.
pub const MIN_HEADER_LEN: usize = 20;

const PROTOCOLS: &[(&str, (&str, Option<Protocol>))] = &[
    ("01", ("ICMP", Some(Protocol::Icmp))),
    ("04", ("IPIP", Some(Protocol::Ipv4))),
    ("06", ("TCP", Some(Protocol::Tcp))),
    ("11", ("UDP", Some(Protocol::Udp))),
    ("2f", ("GRE", Some(Protocol::Gre))),
    ("29", ("IPv6", None)),
    ("32", ("ESP", None)),
    ("59", ("OSPF", None)),
];

const DONT_FRAGMENT: u64 = 0b010;
const MORE_FRAGMENTS: u64 = 0b001;

fn flags_text(flags: u64) -> String {
    let mut names = Vec::new();
    if flags & DONT_FRAGMENT != 0 {
        names.push("Don't fragment");
    }
    if flags & MORE_FRAGMENTS != 0 {
        names.push("More fragments");
    }
    if names.is_empty() {
        format!("0x{flags:x}")
    } else {
        format!("0x{flags:x}, {}", names.join(", "))
    }
}

pub(crate) fn decode(data: Octets<'_>) -> Decoded<'_> {
    if data.len() < MIN_HEADER_LEN {
        tracing::trace!(len = data.len(), "ipv4 header too short");
        return Decoded::malformed();
    }

    let version = data.byte(0) >> 4;
    let ihl = usize::from(data.byte(0) & 0x0f);
    let header_len = ihl * 4;
    if header_len < MIN_HEADER_LEN || header_len > data.len() {
        tracing::trace!(header_len, len = data.len(), "bad ipv4 header length");
        return Decoded::malformed();
    }

    let total_len = data.be(2..4) as usize;
    let flags_offset = data.be(6..8);
    let flags = flags_offset >> 13;
    let fragment_offset = flags_offset & 0x1fff;
    let proto_key = data.key(9);
    let proto = lookup(PROTOCOLS, proto_key);

    let mut fields = FieldTable::new();
    fields.push("Version:", version.to_string());
    fields.push("Header Length:", format!("{header_len} bytes ({ihl})"));
    fields.push("Total Length:", total_len.to_string());
    fields.push(
        "Identification:",
        format!("{} ({})", data.hex(4..6), data.be(4..6)),
    );
    fields.push("Flags:", flags_text(flags));
    fields.push("Fragment Offset:", fragment_offset.to_string());
    fields.push("Time to Live:", data.be(8..9).to_string());
    fields.push(
        "Protocol:",
        match proto {
            Some((name, _)) => format!("{name} ({proto_key})"),
            None => format!("Unknown ({proto_key})"),
        },
    );
    fields.push("Header Checksum:", data.hex(10..12));
    fields.push("Source Address:", data.ipv4(12..16));
    fields.push("Destination Address:", data.ipv4(16..20));

    // Later fragments carry no transport header of their own.
    if fragment_offset != 0 {
        return Decoded::last(fields);
    }

    // Drop link-layer padding past the datagram's declared length.
    let datagram = if total_len >= header_len {
        data.take(total_len)
    } else {
        data
    };
    let payload = datagram.skip(header_len);

    match proto.and_then(|(_, next)| next) {
        Some(next) => Decoded::then(fields, next, payload),
        None => Decoded::last(fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octets::HexStream;

    fn header(proto: &str, flags_frag: &str, extra: &str) -> HexStream {
        HexStream::parse(&format!(
            "45 00 00 1c 1c 46 {flags_frag} 40 {proto} b1 e6 c0 00 02 01 c0 00 02 02 {extra}"
        ))
    }

    #[test]
    fn crafted_icmp_header() {
        let s = header("01", "40 00", "08 00 f7 ff 00 00 00 00");
        let d = decode(s.octets());
        let f = &d.fields;
        assert_eq!(f.get("Version:"), Some("4"));
        assert_eq!(f.get("Header Length:"), Some("20 bytes (5)"));
        assert_eq!(f.get("Total Length:"), Some("28"));
        assert_eq!(f.get("Identification:"), Some("0x1c46 (7238)"));
        assert_eq!(f.get("Flags:"), Some("0x2, Don't fragment"));
        assert_eq!(f.get("Fragment Offset:"), Some("0"));
        assert_eq!(f.get("Time to Live:"), Some("64"));
        assert_eq!(f.get("Protocol:"), Some("ICMP (01)"));
        assert_eq!(f.get("Header Checksum:"), Some("0xb1e6"));
        assert_eq!(f.get("Source Address:"), Some("192.0.2.1"));
        assert_eq!(f.get("Destination Address:"), Some("192.0.2.2"));

        let (next, payload) = d.next.unwrap();
        assert_eq!(next, Protocol::Icmp);
        assert_eq!(payload.len(), 8);
    }

    #[test]
    fn nonzero_fragment_offset_stops() {
        let s = header("06", "20 b9", "00 00");
        let d = decode(s.octets());
        assert_eq!(d.fields.get("Flags:"), Some("0x1, More fragments"));
        assert_eq!(d.fields.get("Fragment Offset:"), Some("185"));
        assert!(d.next.is_none());
    }

    #[test]
    fn padding_is_trimmed() {
        let s = header("11", "00 00", "00 35 00 35 00 08 00 00 00 00 00 00");
        let (next, payload) = decode(s.octets()).next.unwrap();
        assert_eq!(next, Protocol::Udp);
        assert_eq!(payload.len(), 8);
    }

    #[test]
    fn unknown_protocol_stops() {
        let s = header("99", "00 00", "");
        let d = decode(s.octets());
        assert_eq!(d.fields.get("Protocol:"), Some("Unknown (99)"));
        assert_eq!(d.fields.get("Flags:"), Some("0x0"));
        assert!(d.next.is_none());
    }

    #[test]
    fn known_but_undecoded_protocol_stops() {
        let s = header("59", "00 00", "");
        let d = decode(s.octets());
        assert_eq!(d.fields.get("Protocol:"), Some("OSPF (59)"));
        assert!(d.next.is_none());
    }

    #[test]
    fn bad_header_length_is_empty() {
        let s = HexStream::parse("44 00 00 14 00 00 00 00 40 01 00 00 0a 00 00 01 0a 00 00 02");
        assert!(decode(s.octets()).fields.is_empty());

        let s = HexStream::parse("46 00 00 18 00 00 00 00 40 01 00 00 0a 00 00 01 0a 00 00 02");
        assert!(decode(s.octets()).fields.is_empty());
    }

    #[test]
    fn short_is_empty() {
        let s = HexStream::parse("45 00 00 1c");
        assert!(decode(s.octets()).fields.is_empty());
    }
}
