//! Minimal CBOR reader used to check encoder output in round-trip tests.
//!
//! Deliberately small: it understands exactly the shapes this encoder can
//! produce (definite scalars and containers, indefinite containers,
//! chunked text, tags) and panics loudly on anything else.

#![allow(dead_code)]

/// Decoded CBOR item. Floats keep their raw bits so NaN payloads compare
/// exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    UInt(u64),
    /// Negative integer `-1 - n`.
    NInt(u64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tag(u64, Box<Value>),
    F32(u32),
    F64(u64),
    Simple(u8),
}

impl Value {
    pub fn f64(v: f64) -> Self {
        Value::F64(v.to_bits())
    }

    pub fn f32(v: f32) -> Self {
        Value::F32(v.to_bits())
    }

    pub fn text(s: &str) -> Self {
        Value::Text(s.to_owned())
    }

    /// Signed interpretation of an integer item.
    pub fn as_i128(&self) -> i128 {
        match self {
            Value::UInt(n) => i128::from(*n),
            Value::NInt(n) => -1 - i128::from(*n),
            other => panic!("not an integer: {other:?}"),
        }
    }
}

/// Decode exactly one item, requiring the input to be fully consumed.
pub fn decode(bytes: &[u8]) -> Value {
    let mut r = Reader { data: bytes, pos: 0 };
    let v = r.item();
    assert_eq!(r.pos, bytes.len(), "trailing bytes after item");
    v
}

/// Decode a sequence of root-level items.
pub fn decode_all(bytes: &[u8]) -> Vec<Value> {
    let mut r = Reader { data: bytes, pos: 0 };
    let mut out = Vec::new();
    while r.pos < r.data.len() {
        out.push(r.item());
    }
    out
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn u8(&mut self) -> u8 {
        let b = self.data[self.pos];
        self.pos += 1;
        b
    }

    fn peek(&self) -> u8 {
        self.data[self.pos]
    }

    fn take(&mut self, n: usize) -> &[u8] {
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        s
    }

    fn arg(&mut self, info: u8) -> u64 {
        match info {
            0..=23 => u64::from(info),
            24 => u64::from(self.u8()),
            25 => {
                let s = self.take(2);
                u64::from(u16::from_be_bytes([s[0], s[1]]))
            }
            26 => {
                let s = self.take(4);
                u64::from(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
            }
            27 => {
                let s = self.take(8);
                u64::from_be_bytes(s.try_into().unwrap())
            }
            other => panic!("unsupported additional info {other}"),
        }
    }

    fn item(&mut self) -> Value {
        let ib = self.u8();
        let major = ib >> 5;
        let info = ib & 0x1f;
        match major {
            0 => Value::UInt(self.arg(info)),
            1 => Value::NInt(self.arg(info)),
            2 => {
                let len = self.arg(info) as usize;
                Value::Bytes(self.take(len).to_vec())
            }
            3 => {
                if info == 31 {
                    let mut text = String::new();
                    while self.peek() != 0xff {
                        let chunk = self.item();
                        match chunk {
                            Value::Text(s) => text.push_str(&s),
                            other => panic!("non-text chunk {other:?}"),
                        }
                    }
                    self.pos += 1;
                    Value::Text(text)
                } else {
                    let len = self.arg(info) as usize;
                    Value::Text(String::from_utf8(self.take(len).to_vec()).unwrap())
                }
            }
            4 => {
                let mut items = Vec::new();
                if info == 31 {
                    while self.peek() != 0xff {
                        items.push(self.item());
                    }
                    self.pos += 1;
                } else {
                    for _ in 0..self.arg(info) {
                        items.push(self.item());
                    }
                }
                Value::Array(items)
            }
            5 => {
                let mut entries = Vec::new();
                if info == 31 {
                    while self.peek() != 0xff {
                        let k = self.item();
                        let v = self.item();
                        entries.push((k, v));
                    }
                    self.pos += 1;
                } else {
                    for _ in 0..self.arg(info) {
                        let k = self.item();
                        let v = self.item();
                        entries.push((k, v));
                    }
                }
                Value::Map(entries)
            }
            6 => {
                let tag = self.arg(info);
                Value::Tag(tag, Box::new(self.item()))
            }
            7 => match info {
                20 => Value::Bool(false),
                21 => Value::Bool(true),
                22 => Value::Null,
                24 => Value::Simple(self.u8()),
                26 => {
                    let s = self.take(4);
                    Value::F32(u32::from_be_bytes(s.try_into().unwrap()))
                }
                27 => {
                    let s = self.take(8);
                    Value::F64(u64::from_be_bytes(s.try_into().unwrap()))
                }
                other => panic!("unsupported simple/float info {other}"),
            },
            _ => unreachable!(),
        }
    }
}
