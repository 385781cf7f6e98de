//! Minimal CBOR (RFC 8949) encoder for Internet Computer envelopes.

/// Self-describing CBOR tag prefix.
pub const SELF_DESCRIBE_TAG: u64 = 55799;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CborValue {
    Unsigned(u64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<CborValue>),
    /// Text-keyed map, written in insertion order.
    Map(Vec<(String, CborValue)>),
    Tag(u64, Box<CborValue>),
}

impl CborValue {
    pub fn text(value: impl Into<String>) -> Self {
        CborValue::Text(value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        CborValue::Bytes(value.into())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, CborValue)>) -> Self {
        CborValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            CborValue::Unsigned(n) => write_head(out, 0, *n),
            CborValue::Bytes(b) => {
                write_head(out, 2, b.len() as u64);
                out.extend_from_slice(b);
            }
            CborValue::Text(s) => {
                write_head(out, 3, s.len() as u64);
                out.extend_from_slice(s.as_bytes());
            }
            CborValue::Array(items) => {
                write_head(out, 4, items.len() as u64);
                for item in items {
                    item.write(out);
                }
            }
            CborValue::Map(entries) => {
                write_head(out, 5, entries.len() as u64);
                for (key, value) in entries {
                    write_head(out, 3, key.len() as u64);
                    out.extend_from_slice(key.as_bytes());
                    value.write(out);
                }
            }
            CborValue::Tag(tag, inner) => {
                write_head(out, 6, *tag);
                inner.write(out);
            }
        }
    }
}

fn write_head(out: &mut Vec<u8>, major: u8, value: u64) {
    let major = major << 5;
    match value {
        0..=23 => out.push(major | value as u8),
        24..=0xff => {
            out.push(major | 24);
            out.push(value as u8);
        }
        0x100..=0xffff => {
            out.push(major | 25);
            out.extend_from_slice(&(value as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(major | 26);
            out.extend_from_slice(&(value as u32).to_be_bytes());
        }
        _ => {
            out.push(major | 27);
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
}
