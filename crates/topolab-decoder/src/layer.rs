//! Decoded protocol layers.

use serde::{Deserialize, Serialize};

use crate::octets::Octets;

/// Protocols the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Ethernet,
    Llc,
    SpanningTree,
    Arp,
    Ipv4,
    Icmp,
    Tcp,
    Udp,
    Gre,
}

impl Protocol {
    /// Section heading shown above the field table.
    pub fn title(&self) -> &'static str {
        match self {
            Protocol::Ethernet => "Ethernet II",
            Protocol::Llc => "Logical-Link Control",
            Protocol::SpanningTree => "Spanning Tree Protocol",
            Protocol::Arp => "Address Resolution Protocol",
            Protocol::Ipv4 => "Internet Protocol Version 4",
            Protocol::Icmp => "Internet Control Message Protocol",
            Protocol::Tcp => "Transmission Control Protocol",
            Protocol::Udp => "User Datagram Protocol",
            Protocol::Gre => "Generic Routing Encapsulation",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// One labelled value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Ordered field table of one layer. Order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldTable(Vec<Field>);

impl FieldTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Field {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Value of the first field with this name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the layer decoded nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.0.iter()
    }

    /// Field names in display order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|f| f.name.as_str()).collect()
    }
}

/// A protocol section of a decoded frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    pub protocol: Protocol,
    pub title: &'static str,
    pub fields: FieldTable,
}

impl Layer {
    pub(crate) fn new(protocol: Protocol, fields: FieldTable) -> Self {
        Self {
            protocol,
            title: protocol.title(),
            fields,
        }
    }
}

/// Result of decoding one layer: its table and what to decode next.
pub(crate) struct Decoded<'a> {
    pub fields: FieldTable,
    pub next: Option<(Protocol, Octets<'a>)>,
}

impl<'a> Decoded<'a> {
    /// Header too short or invalid: empty table, chain stops.
    pub fn malformed() -> Self {
        Self {
            fields: FieldTable::new(),
            next: None,
        }
    }

    /// Decoded, nothing follows.
    pub fn last(fields: FieldTable) -> Self {
        Self { fields, next: None }
    }

    /// Decoded, continue with `protocol` over `payload`.
    pub fn then(fields: FieldTable, protocol: Protocol, payload: Octets<'a>) -> Self {
        Self {
            fields,
            next: Some((protocol, payload)),
        }
    }
}

/// Look up an exact two-digit (or four-digit) key in a dispatch table.
pub(crate) fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
