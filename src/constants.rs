//! Byte-level constants of the CBOR wire form (RFC 8949 §3).

/// Major type 0 (unsigned integer) shifted into the initial-byte prefix.
pub const PREFIX_UINT: u8 = 0x00;
/// Major type 1 (negative integer).
pub const PREFIX_NINT: u8 = 0x20;
/// Major type 2 (byte string).
pub const PREFIX_BYTES: u8 = 0x40;
/// Major type 3 (text string).
pub const PREFIX_TEXT: u8 = 0x60;
/// Major type 4 (array).
pub const PREFIX_ARRAY: u8 = 0x80;
/// Major type 5 (map).
pub const PREFIX_MAP: u8 = 0xa0;
/// Major type 6 (tag).
pub const PREFIX_TAG: u8 = 0xc0;
/// Major type 7 (simple values and floats).
pub const PREFIX_SIMPLE: u8 = 0xe0;

/// Additional-info value selecting a one-byte argument.
pub const SUFFIX_U8: u8 = 24;
/// Additional-info value selecting a two-byte argument.
pub const SUFFIX_U16: u8 = 25;
/// Additional-info value selecting a four-byte argument.
pub const SUFFIX_U32: u8 = 26;
/// Additional-info value selecting an eight-byte argument.
pub const SUFFIX_U64: u8 = 27;

/// Empty text string (major 3, argument 0).
pub const BYTE_EMPTY_TEXT: u8 = 0x60;
/// Indefinite-length text string start.
pub const BYTE_TEXT_INDEFINITE: u8 = 0x7f;
/// Indefinite-length array start.
pub const BYTE_ARRAY_INDEFINITE: u8 = 0x9f;
/// Indefinite-length map start.
pub const BYTE_MAP_INDEFINITE: u8 = 0xbf;
/// Two-element definite array head, used by decimal fractions.
pub const BYTE_ARRAY_2_ELEMENTS: u8 = 0x82;

/// Tag 2: positive bignum.
pub const BYTE_TAG_BIGNUM_POS: u8 = 0xc2;
/// Tag 3: negative bignum.
pub const BYTE_TAG_BIGNUM_NEG: u8 = 0xc3;
/// Tag 4: decimal fraction.
pub const BYTE_TAG_DECIMAL_FRACTION: u8 = 0xc4;

/// `false` simple value.
pub const BYTE_FALSE: u8 = 0xf4;
/// `true` simple value.
pub const BYTE_TRUE: u8 = 0xf5;
/// `null` simple value.
pub const BYTE_NULL: u8 = 0xf6;
/// Float32 marker (major 7, ai 26).
pub const BYTE_FLOAT32: u8 = 0xfa;
/// Float64 marker (major 7, ai 27).
pub const BYTE_FLOAT64: u8 = 0xfb;
/// Break byte terminating indefinite-length items.
pub const BYTE_BREAK: u8 = 0xff;

/// Tag id of a stringref backreference.
pub const TAG_ID_STRINGREF: u64 = 25;
/// Tag id of the self-describe header (`D9 D9 F7` on the wire).
pub const TAG_ID_SELF_DESCRIBE: u64 = 55799;

/// First UTF-16 high (leading) surrogate.
pub const SURR1_FIRST: u16 = 0xd800;
/// Last UTF-16 high surrogate.
pub const SURR1_LAST: u16 = 0xdbff;
/// First UTF-16 low (trailing) surrogate.
pub const SURR2_FIRST: u16 = 0xdc00;
/// Last UTF-16 low surrogate.
pub const SURR2_LAST: u16 = 0xdfff;
