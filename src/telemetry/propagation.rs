//! W3C Trace Context identifiers and header codecs.

use std::fmt;

use percent_encoding::percent_decode_str;
use uuid::Uuid;

/// 16-byte trace identifier, never all zeroes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId([u8; 16]);

/// 8-byte span identifier, never all zeroes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId([u8; 8]);

impl TraceId {
    #[must_use]
    pub fn random() -> Self {
        Self(*Uuid::new_v4().as_bytes())
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl SpanId {
    #[must_use]
    pub fn random() -> Self {
        // Byte 6 of a v4 UUID carries the version nibble, so the prefix is never zero.
        let bytes = Uuid::new_v4().into_bytes();
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[..8]);
        Self(id)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self.to_hex())
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self.to_hex())
    }
}

/// Identity of a span as it travels between components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub sampled: bool,
    /// True when the span lives in another process and arrived via headers.
    pub remote: bool,
}

impl SpanContext {
    /// Parses a `traceparent` header value. Returns `None` for anything that is
    /// not a well-formed, non-zero version `00` context.
    #[must_use]
    pub fn from_traceparent(header: &str) -> Option<Self> {
        let parts: Vec<&str> = header.trim().split('-').collect();
        if parts.len() < 4 {
            return None;
        }

        let version = parts[0];
        if !is_lower_hex(version, 2) || version == "ff" {
            return None;
        }
        // Future versions may append fields; version 00 has exactly four.
        if version == "00" && parts.len() != 4 {
            return None;
        }

        let mut trace = [0u8; 16];
        let mut span = [0u8; 8];
        let mut flags = [0u8; 1];
        if !is_lower_hex(parts[1], 32) || !is_lower_hex(parts[2], 16) || !is_lower_hex(parts[3], 2)
        {
            return None;
        }
        hex::decode_to_slice(parts[1], &mut trace).ok()?;
        hex::decode_to_slice(parts[2], &mut span).ok()?;
        hex::decode_to_slice(parts[3], &mut flags).ok()?;

        if trace == [0u8; 16] || span == [0u8; 8] {
            return None;
        }

        Some(Self {
            trace_id: TraceId(trace),
            span_id: SpanId(span),
            sampled: flags[0] & 0x01 == 0x01,
            remote: true,
        })
    }

    #[must_use]
    pub fn to_traceparent(&self) -> String {
        let flags: u8 = if self.sampled { 0x01 } else { 0x00 };
        format!("00-{}-{}-{:02x}", self.trace_id, self.span_id, flags)
    }
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Inbound `baggage` entries, in header order. Properties after `;` are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baggage {
    entries: Vec<(String, String)>,
}

impl Baggage {
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        let entries = header
            .split(',')
            .filter_map(|member| {
                let kv = member.split(';').next()?;
                let (key, value) = kv.split_once('=')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                let value = percent_decode_str(value.trim())
                    .decode_utf8()
                    .ok()?
                    .into_owned();
                Some((key.to_string(), value))
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn test_traceparent_parses_and_formats_back() {
        let ctx = SpanContext::from_traceparent(SAMPLE).unwrap();
        assert_eq!(ctx.trace_id.to_hex(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.span_id.to_hex(), "00f067aa0ba902b7");
        assert!(ctx.sampled);
        assert!(ctx.remote);
        assert_eq!(ctx.to_traceparent(), SAMPLE);
    }

    #[test]
    fn test_traceparent_rejects_malformed_values() {
        let cases = [
            "",
            "garbage",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
        ];
        for case in cases {
            assert!(
                SpanContext::from_traceparent(case).is_none(),
                "accepted malformed traceparent {case:?}"
            );
        }
    }

    #[test]
    fn test_traceparent_accepts_future_version_with_extra_fields() {
        let header = "cc-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00-what";
        let ctx = SpanContext::from_traceparent(header).unwrap();
        assert!(!ctx.sampled);
    }

    #[test]
    fn test_random_ids_are_distinct() {
        assert_ne!(TraceId::random(), TraceId::random());
        assert_ne!(SpanId::random(), SpanId::random());
    }

    #[test]
    fn test_baggage_parsing() {
        let baggage = Baggage::from_header("userId=alice, tenant=acme%20corp;ttl=30,=orphan,broken");
        assert_eq!(baggage.get("userId"), Some("alice"));
        assert_eq!(baggage.get("tenant"), Some("acme corp"));
        assert_eq!(baggage.iter().count(), 2);
        assert!(Baggage::from_header("").is_empty());
    }
}
