/// General purpose register names indexed by the 3-bit `reg`/`rm` field: (byte, word).
pub const REGISTERS: [(&str, &str); 8] = [
    ("al", "ax"),
    ("cl", "cx"),
    ("dl", "dx"),
    ("bl", "bx"),
    ("ah", "sp"),
    ("ch", "bp"),
    ("dh", "si"),
    ("bh", "di"),
];

/// Effective address base/index registers indexed by the 3-bit `rm` field.
///
/// Entry `0b110` is `[bp]` only when a displacement follows; with mode `00` it
/// means a direct address instead.
pub const EFFECTIVE_ADDRESSES: [(&str, Option<&str>); 8] = [
    ("bx", Some("si")),
    ("bx", Some("di")),
    ("bp", Some("si")),
    ("bp", Some("di")),
    ("si", None),
    ("di", None),
    ("bp", None),
    ("bx", None),
];

pub const DIRECT_ADDRESS_RM: u8 = 0b110;
