//! Bit-field access on single instruction bytes.
//!
//! Bits are numbered the way the 8086 manuals draw them: bit 7 is the most
//! significant bit, bit 0 the least significant.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Byte(pub u8);

impl Byte {
    /// Extracts the bit range `HI..=LO`, right-aligned.
    pub fn bits<const HI: u32, const LO: u32>(self) -> u8 {
        const { assert!(HI >= LO && HI < 8) };

        let mask = const { 0xFFu8 >> (7 - HI) };
        (self.0 & mask) >> LO
    }

    pub fn bit<const BIT: u32>(self) -> bool {
        self.bits::<BIT, BIT>() != 0
    }

    /// The leading `WIDTH` bits, right-aligned. Used for opcode candidates.
    pub fn opcode<const WIDTH: u32>(self) -> u8 {
        const { assert!(WIDTH >= 1 && WIDTH <= 8) };
        self.0 >> (8 - WIDTH)
    }

    /// The `d` bit of a two-operand lead byte.
    pub fn direction(self) -> bool {
        self.bit::<1>()
    }

    /// The `w` bit of a lead byte whose opcode ends at bit 1 or 2.
    pub fn wide(self) -> bool {
        self.bit::<0>()
    }

    /// The `w` bit of a `1011wreg` lead byte.
    pub fn wide_imm_reg(self) -> bool {
        self.bit::<3>()
    }

    /// The `reg` field embedded in a `1011wreg` lead byte.
    pub fn embedded_reg(self) -> u8 {
        self.bits::<2, 0>()
    }

    // ModR/M byte

    pub fn mode(self) -> u8 {
        self.bits::<7, 6>()
    }

    pub fn reg(self) -> u8 {
        self.bits::<5, 3>()
    }

    pub fn rm(self) -> u8 {
        self.bits::<2, 0>()
    }
}

/// Composes a little-endian 16-bit value: `lo` is the byte at the lower address.
pub fn le_u16(lo: Byte, hi: Byte) -> u16 {
    u16::from_le_bytes([lo.0, hi.0])
}

pub fn le_i16(lo: Byte, hi: Byte) -> i16 {
    le_u16(lo, hi) as i16
}
