use std::fmt;

use crate::{
    byte::Byte,
    decoder::{DecodeError, Window},
    tables::{DIRECT_ADDRESS_RM, EFFECTIVE_ADDRESSES, REGISTERS},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    pub fn from_w_bit(wide: bool) -> Self {
        if wide { Width::Word } else { Width::Byte }
    }

    /// Size in bytes of an immediate of this width.
    pub fn size(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Width::Byte => "byte",
            Width::Word => "word",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Register {
    index: u8,
    width: Width,
}

impl Register {
    pub fn new(index: u8, width: Width) -> Self {
        assert!(index < 8, "register field out of range: {index:#b}");
        Self { index, width }
    }

    pub fn width(self) -> Width {
        self.width
    }

    pub fn name(self) -> &'static str {
        let (byte, word) = REGISTERS[self.index as usize];
        match self.width {
            Width::Byte => byte,
            Width::Word => word,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A base (and optional index) register expression with a signed displacement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EffectiveAddress {
    rm: u8,
    displacement: i16,
}

impl EffectiveAddress {
    pub fn new(rm: u8, displacement: i16) -> Self {
        assert!(rm < 8, "rm field out of range: {rm:#b}");
        Self { rm, displacement }
    }

    pub fn base(self) -> &'static str {
        EFFECTIVE_ADDRESSES[self.rm as usize].0
    }

    pub fn index(self) -> Option<&'static str> {
        EFFECTIVE_ADDRESSES[self.rm as usize].1
    }

    pub fn displacement(self) -> i16 {
        self.displacement
    }
}

impl fmt::Display for EffectiveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.base())?;
        if let Some(index) = self.index() {
            write!(f, " + {index}")?;
        }
        match self.displacement {
            0 => {}
            d if d < 0 => write!(f, " - {}", d.unsigned_abs())?,
            d => write!(f, " + {d}")?,
        }
        f.write_str("]")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Immediate {
    value: i16,
    /// Written before the value when the destination does not imply a size.
    size: Option<Width>,
}

impl Immediate {
    pub fn new(value: i16) -> Self {
        Self { value, size: None }
    }

    pub fn sized(value: i16, width: Width) -> Self {
        Self {
            value,
            size: Some(width),
        }
    }

    pub fn value(self) -> i16 {
        self.value
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(size) = self.size {
            write!(f, "{} ", size.keyword())?;
        }
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Direct(u16),
    Indexed(EffectiveAddress),
    Immediate(Immediate),
}

impl Operand {
    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::Direct(_) | Operand::Indexed(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{register}"),
            Operand::Direct(address) => write!(f, "[{address}]"),
            Operand::Indexed(address) => write!(f, "{address}"),
            Operand::Immediate(immediate) => write!(f, "{immediate}"),
        }
    }
}

/// The `mod` field of a ModR/M byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// `00`: memory without displacement, or a direct address when `rm == 110`.
    Memory,
    /// `01`: memory with an 8-bit displacement.
    Memory8,
    /// `10`: memory with a 16-bit displacement.
    Memory16,
    /// `11`: register to register.
    Register,
}

impl Mode {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Mode::Memory),
            0b01 => Some(Mode::Memory8),
            0b10 => Some(Mode::Memory16),
            0b11 => Some(Mode::Register),
            _ => None,
        }
    }

    /// Number of displacement/address bytes following the ModR/M byte.
    pub fn extra_size(self, rm: u8) -> usize {
        match self {
            Mode::Register => 0,
            Mode::Memory if rm == DIRECT_ADDRESS_RM => 2,
            Mode::Memory => 0,
            Mode::Memory8 => 1,
            Mode::Memory16 => 2,
        }
    }
}

fn mode_of(window: &Window<'_>, modrm: Byte) -> Result<Mode, DecodeError> {
    Mode::from_bits(modrm.mode()).ok_or(DecodeError::InvalidField {
        field: "mod",
        value: modrm.mode(),
        offset: window.offset(),
    })
}

/// Number of bytes the `rm` operand of `modrm` occupies after the ModR/M byte.
pub fn rm_extra_size(window: &Window<'_>, modrm: Byte) -> Result<usize, DecodeError> {
    Ok(mode_of(window, modrm)?.extra_size(modrm.rm()))
}

/// Resolves the `rm` operand of a ModR/M byte.
///
/// `at` is the window index of the first byte after the ModR/M byte. Returns the operand and the number of
/// displacement/address bytes it consumed.
pub fn resolve_rm(
    window: &Window<'_>,
    modrm: Byte,
    width: Width,
    at: usize,
) -> Result<(Operand, usize), DecodeError> {
    let mode = mode_of(window, modrm)?;
    let rm = modrm.rm();

    Ok(match mode {
        Mode::Register => (Operand::Register(Register::new(rm, width)), 0),
        Mode::Memory if rm == DIRECT_ADDRESS_RM => (Operand::Direct(window.u16(at)?), 2),
        Mode::Memory => (Operand::Indexed(EffectiveAddress::new(rm, 0)), 0),
        Mode::Memory8 => {
            let displacement = i16::from(window.i8(at)?);
            (Operand::Indexed(EffectiveAddress::new(rm, displacement)), 1)
        }
        Mode::Memory16 => {
            let displacement = window.i16(at)?;
            (Operand::Indexed(EffectiveAddress::new(rm, displacement)), 2)
        }
    })
}

/// Reads an immediate of the given width starting at window index `at`. Byte immediates are sign-extended.
pub fn resolve_immediate(
    window: &Window<'_>,
    at: usize,
    width: Width,
) -> Result<(i16, usize), DecodeError> {
    let value = match width {
        Width::Byte => i16::from(window.i8(at)?),
        Width::Word => window.i16(at)?,
    };
    Ok((value, width.size()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rm(bytes: &[u8], width: Width) -> (String, usize) {
        let window = Window::new(bytes, 0);
        let (operand, extra) = resolve_rm(&window, window.byte(1).unwrap(), width, 2).unwrap();
        (operand.to_string(), extra)
    }

    #[test]
    fn register_mode_never_reads_displacement() {
        for byte in 0u8..=0xFF {
            if byte >> 6 != 0b11 {
                continue;
            }
            // No trailing bytes: any read past the ModR/M byte would fail.
            let bytes = [0x88, byte];
            let window = Window::new(&bytes, 0);
            let (operand, extra) = resolve_rm(&window, Byte(byte), Width::Word, 2).unwrap();
            assert_eq!(extra, 0);
            assert!(matches!(operand, Operand::Register(_)));
        }
        assert_eq!(rm(&[0x89, 0b11_000_110], Width::Word), ("si".into(), 0));
        assert_eq!(rm(&[0x88, 0b11_000_110], Width::Byte), ("dh".into(), 0));
    }

    #[test]
    fn memory_mode_without_displacement() {
        assert_eq!(rm(&[0x8A, 0b00_000_000], Width::Byte), ("[bx + si]".into(), 0));
        assert_eq!(rm(&[0x8B, 0b00_011_011], Width::Word), ("[bp + di]".into(), 0));
        assert_eq!(rm(&[0x8B, 0b00_000_111], Width::Word), ("[bx]".into(), 0));
    }

    #[test]
    fn direct_address_only_in_memory_mode() {
        assert_eq!(rm(&[0x8B, 0b00_101_110, 0x05, 0x00], Width::Word), ("[5]".into(), 2));
        assert_eq!(rm(&[0x8B, 0b00_011_110, 0x82, 0x0D], Width::Word), ("[3458]".into(), 2));
        assert_eq!(rm(&[0x8B, 0b00_011_110, 0xFF, 0xFF], Width::Word), ("[65535]".into(), 2));
        assert_eq!(rm(&[0x8B, 0b01_010_110, 0x00], Width::Word), ("[bp]".into(), 1));
        assert_eq!(rm(&[0x8B, 0b10_010_110, 0x10, 0x00], Width::Word), ("[bp + 16]".into(), 2));
    }

    #[test]
    fn displacements() {
        assert_eq!(rm(&[0x8A, 0b01_100_000, 0x04], Width::Byte), ("[bx + si + 4]".into(), 1));
        assert_eq!(rm(&[0x8B, 0b01_000_001, 0xDB], Width::Word), ("[bx + di - 37]".into(), 1));
        assert_eq!(rm(&[0x8B, 0b01_010_111, 0xE0], Width::Word), ("[bx - 32]".into(), 1));
        assert_eq!(rm(&[0x8A, 0b10_000_000, 0x87, 0x13], Width::Byte), ("[bx + si + 4999]".into(), 2));
        assert_eq!(rm(&[0x89, 0b10_001_100, 0xD4, 0xFE], Width::Word), ("[si - 300]".into(), 2));
        assert_eq!(rm(&[0x89, 0b10_001_100, 0x00, 0x80], Width::Word), ("[si - 32768]".into(), 2));
    }

    #[test]
    fn displacement_text_reparses_to_same_value() {
        for displacement in [i16::MIN, -300, -1, 0, 1, 127, i16::MAX] {
            let text = EffectiveAddress::new(0b111, displacement).to_string();
            let inner = text.trim_start_matches("[bx").trim_end_matches(']');
            let reparsed: i32 = match inner.split_once(' ') {
                None => 0,
                Some(("", rest)) => match rest.split_once(' ') {
                    Some(("+", n)) => n.parse().unwrap(),
                    Some(("-", n)) => -n.parse::<i32>().unwrap(),
                    other => panic!("unexpected offset term {other:?} in {text}"),
                },
                Some(_) => panic!("unexpected text {text}"),
            };
            assert_eq!(reparsed, i32::from(displacement), "{text}");
        }
    }

    #[test]
    fn extra_size_matches_resolved_operand() {
        for modrm in 0u8..=0xFF {
            let bytes = [0x8B, modrm, 0, 0];
            let window = Window::new(&bytes, 0);
            let (_, extra) = resolve_rm(&window, Byte(modrm), Width::Word, 2).unwrap();
            assert_eq!(rm_extra_size(&window, Byte(modrm)).unwrap(), extra, "modrm {modrm:#010b}");
        }
    }

    #[test]
    fn immediates_are_sign_extended() {
        let window = Window::new(&[0xB5, 0xF4, 0xFF], 0);
        assert_eq!(resolve_immediate(&window, 1, Width::Byte).unwrap(), (-12, 1));
        assert_eq!(resolve_immediate(&window, 1, Width::Word).unwrap(), (-12, 2));

        let window = Window::new(&[0xBA, 0x6C, 0x0F], 0);
        assert_eq!(resolve_immediate(&window, 1, Width::Word).unwrap(), (3948, 2));
    }

    #[test]
    fn sized_immediates() {
        assert_eq!(Immediate::sized(7, Width::Byte).to_string(), "byte 7");
        assert_eq!(Immediate::sized(-2, Width::Word).to_string(), "word -2");
        assert_eq!(Immediate::new(12).to_string(), "12");
    }
}
