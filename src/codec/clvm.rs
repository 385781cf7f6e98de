//! CLVM program serialization and tree hashing.

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClvmError {
    #[error("unexpected end of program bytes")]
    UnexpectedEnd,
    #[error("atom of {0} bytes is too long to serialize")]
    AtomTooLong(usize),
    #[error("{0} trailing bytes after program")]
    TrailingBytes(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    Atom(Vec<u8>),
    Pair(Box<Program>, Box<Program>),
}

impl Program {
    pub fn nil() -> Self {
        Program::Atom(Vec::new())
    }

    pub fn atom(bytes: impl Into<Vec<u8>>) -> Self {
        Program::Atom(bytes.into())
    }

    pub fn int(value: u128) -> Self {
        Program::Atom(encode_int(value))
    }

    pub fn cons(first: Program, rest: Program) -> Self {
        Program::Pair(Box::new(first), Box::new(rest))
    }

    /// Proper list `(a b c)`, nil-terminated.
    pub fn list(items: impl IntoIterator<Item = Program>) -> Self {
        let items: Vec<Program> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Program::nil(), |rest, item| Program::cons(item, rest))
    }

    pub fn first(&self) -> Option<&Program> {
        match self {
            Program::Pair(first, _) => Some(first),
            Program::Atom(_) => None,
        }
    }

    pub fn tree_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        match self {
            Program::Atom(bytes) => {
                hasher.update([1u8]);
                hasher.update(bytes);
            }
            Program::Pair(first, rest) => {
                hasher.update([2u8]);
                hasher.update(first.tree_hash());
                hasher.update(rest.tree_hash());
            }
        }
        hasher.finalize().into()
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ClvmError> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), ClvmError> {
        match self {
            Program::Pair(first, rest) => {
                out.push(0xff);
                first.write(out)?;
                rest.write(out)
            }
            Program::Atom(bytes) => {
                let len = bytes.len();
                match len {
                    0 => out.push(0x80),
                    1 if bytes[0] < 0x80 => out.push(bytes[0]),
                    1..=0x3f => out.push(0x80 | len as u8),
                    0x40..=0x1fff => {
                        out.push(0xc0 | (len >> 8) as u8);
                        out.push(len as u8);
                    }
                    0x2000..=0xf_ffff => {
                        out.push(0xe0 | (len >> 16) as u8);
                        out.push((len >> 8) as u8);
                        out.push(len as u8);
                    }
                    _ => return Err(ClvmError::AtomTooLong(len)),
                }
                if !(len == 1 && bytes[0] < 0x80) {
                    out.extend_from_slice(bytes);
                }
                Ok(())
            }
        }
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, ClvmError> {
        let mut pos = 0;
        let program = read(bytes, &mut pos)?;
        if pos != bytes.len() {
            return Err(ClvmError::TrailingBytes(bytes.len() - pos));
        }
        Ok(program)
    }
}

fn read(bytes: &[u8], pos: &mut usize) -> Result<Program, ClvmError> {
    let byte = *bytes.get(*pos).ok_or(ClvmError::UnexpectedEnd)?;
    *pos += 1;
    if byte == 0xff {
        let first = read(bytes, pos)?;
        let rest = read(bytes, pos)?;
        return Ok(Program::cons(first, rest));
    }
    if byte == 0x80 {
        return Ok(Program::nil());
    }
    if byte < 0x80 {
        return Ok(Program::Atom(vec![byte]));
    }

    let len = if byte & 0xc0 == 0x80 {
        usize::from(byte & 0x3f)
    } else if byte & 0xe0 == 0xc0 {
        let next = *bytes.get(*pos).ok_or(ClvmError::UnexpectedEnd)?;
        *pos += 1;
        (usize::from(byte & 0x1f) << 8) | usize::from(next)
    } else {
        let extra = bytes.get(*pos..*pos + 2).ok_or(ClvmError::UnexpectedEnd)?;
        *pos += 2;
        (usize::from(byte & 0x0f) << 16) | (usize::from(extra[0]) << 8) | usize::from(extra[1])
    };

    let atom = bytes.get(*pos..*pos + len).ok_or(ClvmError::UnexpectedEnd)?;
    *pos += len;
    Ok(Program::Atom(atom.to_vec()))
}

/// Minimal big-endian two's-complement encoding of a non-negative integer.
/// Zero is the empty atom.
pub fn encode_int(value: u128) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let be = value.to_be_bytes();
    let leading_zeros = be.iter().take_while(|&&b| b == 0).count();
    let mut out = Vec::with_capacity(17);
    if be[leading_zeros] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&be[leading_zeros..]);
    out
}
