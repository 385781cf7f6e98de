//! RLP encoding helpers

pub fn encode_u64(val: u64) -> Vec<u8> {
    encode_uint_bytes(&val.to_be_bytes())
}

pub fn encode_u128(val: u128) -> Vec<u8> {
    encode_uint_bytes(&val.to_be_bytes())
}

/// Encode a big-endian unsigned integer of any width as a minimal RLP scalar.
pub fn encode_uint_bytes(be: &[u8]) -> Vec<u8> {
    let leading_zeros = be.iter().take_while(|&&b| b == 0).count();
    encode_bytes(&be[leading_zeros..])
}

pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        return data.to_vec();
    }
    let mut result = encode_header(0x80, 0xb7, data.len());
    result.extend_from_slice(data);
    result
}

pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = items.concat();
    let mut result = encode_header(0xc0, 0xf7, payload.len());
    result.extend_from_slice(&payload);
    result
}

fn encode_header(short_base: u8, long_base: u8, len: usize) -> Vec<u8> {
    if len < 56 {
        vec![short_base + len as u8]
    } else {
        let len_bytes = encode_length(len);
        let mut header = vec![long_base + len_bytes.len() as u8];
        header.extend_from_slice(&len_bytes);
        header
    }
}

fn encode_length(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    bytes[leading_zeros..].to_vec()
}
