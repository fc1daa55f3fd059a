//! Hex octet streams.
//!
//! Captures arrive as text: two hex digits per octet, separated by
//! whitespace. Decoders keep both forms side by side. The text form is what
//! protocol dispatch keys on; the byte form is what numeric fields read.

use std::ops::Range;

/// An owned, validated octet stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexStream {
    text: Vec<String>,
    bytes: Vec<u8>,
}

impl HexStream {
    /// Tokenize a capture string.
    ///
    /// Tokens are lowercased. The stream ends at the first token that is not
    /// exactly one octet; everything before it is kept.
    pub fn parse(raw: &str) -> Self {
        let mut stream = Self::default();
        for (index, token) in raw.split_whitespace().enumerate() {
            let token = token.to_ascii_lowercase();
            match hex::decode(&token) {
                Ok(byte) if byte.len() == 1 => {
                    stream.bytes.push(byte[0]);
                    stream.text.push(token);
                }
                _ => {
                    tracing::debug!(index, %token, "capture truncated at invalid octet");
                    break;
                }
            }
        }
        stream
    }

    /// Number of octets.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the stream holds no octets.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrowed view of the whole stream.
    pub fn octets(&self) -> Octets<'_> {
        Octets {
            text: &self.text,
            bytes: &self.bytes,
        }
    }
}

/// A borrowed window into a [`HexStream`].
///
/// Range accessors assume the caller has checked `len()` against the layer's
/// minimum header size.
#[derive(Debug, Clone, Copy)]
pub struct Octets<'a> {
    text: &'a [String],
    bytes: &'a [u8],
}

impl<'a> Octets<'a> {
    /// Number of octets in the window.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Two-digit text of one octet.
    pub fn key(&self, index: usize) -> &'a str {
        &self.text[index]
    }

    /// Concatenated text of a range, e.g. `"0800"`.
    pub fn joined(&self, range: Range<usize>) -> String {
        self.text[range].concat()
    }

    /// Raw byte at an index.
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes[index]
    }

    /// Big-endian unsigned value of a range of up to eight octets.
    pub fn be(&self, range: Range<usize>) -> u64 {
        self.bytes[range]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }

    /// `0x`-prefixed hex text of a range.
    pub fn hex(&self, range: Range<usize>) -> String {
        format!("0x{}", self.joined(range))
    }

    /// Colon-joined MAC address of a six-octet range.
    pub fn mac(&self, range: Range<usize>) -> String {
        self.text[range].join(":")
    }

    /// Dotted-decimal IPv4 address of a four-octet range.
    pub fn ipv4(&self, range: Range<usize>) -> String {
        self.bytes[range]
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Window starting `count` octets in. Saturates to empty.
    pub fn skip(&self, count: usize) -> Octets<'a> {
        let count = count.min(self.len());
        Octets {
            text: &self.text[count..],
            bytes: &self.bytes[count..],
        }
    }

    /// Window of the first `count` octets. Saturates to the whole window.
    pub fn take(&self, count: usize) -> Octets<'a> {
        let count = count.min(self.len());
        Octets {
            text: &self.text[..count],
            bytes: &self.bytes[..count],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lowercases_and_validates() {
        let s = HexStream::parse("FF 0a  1B\n00");
        assert_eq!(s.len(), 4);
        let o = s.octets();
        assert_eq!(o.key(0), "ff");
        assert_eq!(o.key(2), "1b");
        assert_eq!(o.byte(1), 0x0a);
    }

    #[test]
    fn parse_stops_at_bad_token() {
        let s = HexStream::parse("01 02 zz 03");
        assert_eq!(s.len(), 2);

        let s = HexStream::parse("01 0203 04");
        assert_eq!(s.len(), 1);

        assert!(HexStream::parse("").is_empty());
    }

    #[test]
    fn accessors() {
        let s = HexStream::parse("08 00 c0 00 02 01 de ad be ef 00 01");
        let o = s.octets();
        assert_eq!(o.joined(0..2), "0800");
        assert_eq!(o.be(0..2), 0x0800);
        assert_eq!(o.hex(6..10), "0xdeadbeef");
        assert_eq!(o.ipv4(2..6), "192.0.2.1");
        assert_eq!(o.mac(6..12), "de:ad:be:ef:00:01");
    }

    #[test]
    fn skip_and_take_saturate() {
        let s = HexStream::parse("01 02 03");
        let o = s.octets();
        assert_eq!(o.skip(1).key(0), "02");
        assert!(o.skip(10).is_empty());
        assert_eq!(o.take(2).len(), 2);
        assert_eq!(o.take(10).len(), 3);
    }
}
