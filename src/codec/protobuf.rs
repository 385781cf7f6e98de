//! Protocol Buffers encoding
//!
//! Fields are written in the order the caller adds them. Proto3 scalar
//! defaults (0, empty) are omitted; nested messages are always written.

const WIRE_VARINT: u32 = 0;
const WIRE_LEN: u32 = 2;

/// Encode unsigned LEB128 / protobuf varint
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut result = Vec::new();
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        result.push(byte);
        if value == 0 {
            break;
        }
    }
    result
}

#[derive(Debug, Default, Clone)]
pub struct ProtoWriter {
    buf: Vec<u8>,
}

impl ProtoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&mut self, field: u32, wire_type: u32) {
        self.buf.extend(encode_varint(u64::from((field << 3) | wire_type)));
    }

    pub fn uint64(mut self, field: u32, value: u64) -> Self {
        if value != 0 {
            self.key(field, WIRE_VARINT);
            self.buf.extend(encode_varint(value));
        }
        self
    }

    /// `int64` shares the varint layout of `uint64` for non-negative values.
    pub fn int64(self, field: u32, value: i64) -> Self {
        self.uint64(field, value as u64)
    }

    pub fn bytes(mut self, field: u32, value: &[u8]) -> Self {
        if !value.is_empty() {
            self.length_delimited(field, value);
        }
        self
    }

    pub fn string(self, field: u32, value: &str) -> Self {
        self.bytes(field, value.as_bytes())
    }

    pub fn message(mut self, field: u32, encoded: &[u8]) -> Self {
        self.length_delimited(field, encoded);
        self
    }

    fn length_delimited(&mut self, field: u32, value: &[u8]) {
        self.key(field, WIRE_LEN);
        self.buf.extend(encode_varint(value.len() as u64));
        self.buf.extend_from_slice(value);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_varint() {
        assert_eq!(encode_varint(0), vec![0]);
        assert_eq!(encode_varint(127), vec![127]);
        assert_eq!(encode_varint(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xAC, 0x02]);
    }

    #[test]
    fn test_defaults_omitted() {
        let encoded = ProtoWriter::new().uint64(1, 0).bytes(2, &[]).string(3, "").finish();
        assert!(encoded.is_empty());
    }

    #[test]
    fn test_nested_message_always_written() {
        let inner = ProtoWriter::new().finish();
        let encoded = ProtoWriter::new().uint64(1, 150).message(2, &inner).finish();
        assert_eq!(encoded, vec![0x08, 0x96, 0x01, 0x12, 0x00]);
    }
}
