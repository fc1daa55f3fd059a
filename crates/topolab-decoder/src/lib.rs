//! Topolab Header Decoder
//!
//! Turns a captured frame, given as space-separated hex octets, into an
//! ordered list of protocol sections, each an ordered table of labelled
//! values ready for display.
//!
//! # Chain
//!
//! ```text
//! Ethernet ─┬─ length < 1500 ── LLC ── (SAP 0x42) ── STP/RSTP/MSTP
//!           ├─ 0x0806 ───────── ARP
//!           └─ 0x0800 ───────── IPv4 ─┬─ 01 ICMP
//!                                     ├─ 06 TCP
//!                                     ├─ 11 UDP
//!                                     ├─ 04 IPv4 (IP-in-IP)
//!                                     └─ 2f GRE ─┬─ 0800 IPv4
//!                                                └─ 6558 Ethernet
//! ```
//!
//! Dispatch keys on the exact two-digit text of each octet.
//!
//! # Failure
//!
//! Decoding never panics. A layer whose header is too short or invalid shows
//! up as an empty table and ends the chain; the layers before it are kept.
//!
//! # Example
//!
//! ```
//! use topolab_decoder::{decode_packet, Protocol};
//!
//! let frame = "ff ff ff ff ff ff 00 11 22 33 44 55 08 06 \
//!              00 01 08 00 06 04 00 01 00 11 22 33 44 55 c0 a8 01 0a \
//!              00 00 00 00 00 00 c0 a8 01 01";
//! let layers = decode_packet(frame);
//! assert_eq!(layers[1].protocol, Protocol::Arp);
//! assert_eq!(layers[1].fields.get("Opcode:"), Some("request (1)"));
//! ```

mod arp;
mod ethernet;
mod gre;
mod icmp;
mod ipv4;
mod layer;
mod llc;
mod octets;
mod stp;
mod tcp;
mod udp;

pub use gre::gre_header_length;
pub use layer::{Field, FieldTable, Layer, Protocol};
pub use octets::{HexStream, Octets};

use layer::Decoded;

/// Decode a captured frame starting at Ethernet.
pub fn decode_packet(raw: &str) -> Vec<Layer> {
    decode_from(Protocol::Ethernet, raw)
}

/// Decode a byte stream starting at an arbitrary layer.
pub fn decode_from(protocol: Protocol, raw: &str) -> Vec<Layer> {
    let stream = HexStream::parse(raw);
    decode_octets(protocol, stream.octets())
}

/// Decode an already tokenized stream starting at `protocol`.
pub fn decode_octets(protocol: Protocol, data: Octets<'_>) -> Vec<Layer> {
    let mut layers = Vec::new();
    let mut next = Some((protocol, data));

    while let Some((protocol, data)) = next {
        let Decoded { fields, next: after } = decode_layer(protocol, data);
        layers.push(Layer::new(protocol, fields));
        next = after;
    }

    tracing::debug!(layers = layers.len(), "frame decoded");
    layers
}

fn decode_layer(protocol: Protocol, data: Octets<'_>) -> Decoded<'_> {
    match protocol {
        Protocol::Ethernet => ethernet::decode(data),
        Protocol::Llc => llc::decode(data),
        Protocol::SpanningTree => stp::decode(data),
        Protocol::Arp => arp::decode(data),
        Protocol::Ipv4 => ipv4::decode(data),
        Protocol::Icmp => icmp::decode(data),
        Protocol::Tcp => tcp::decode(data),
        Protocol::Udp => udp::decode(data),
        Protocol::Gre => gre::decode(data),
    }
}
