use std::fmt;

use arrayvec::ArrayVec;
use paste::paste;

use crate::{
    byte::Byte,
    decoder::{DecodeError, Window},
    operand::{Immediate, Operand, Register, Width, resolve_immediate, resolve_rm, rm_extra_size},
};

macro_rules! define_opcodes {
    ($($name:ident { width: $width:literal, pattern: $pattern:literal, mnemonic: $mnemonic:literal }),* $(,)?) => {
        paste! {
            /// A supported opcode pattern: the leading `width` bits of the first instruction byte.
            #[derive(Debug, Copy, Clone, PartialEq, Eq)]
            pub enum Opcode {
                $( $name, )*
            }

            const _: () = {
                $( assert!(matches!($width, 4 | 6 | 7) && $pattern >> $width == 0); )*
            };

            impl Opcode {
                pub const ALL: &'static [Opcode] = &[$( Opcode::$name ),*];

                pub fn mnemonic(self) -> &'static str {
                    match self {
                        $( Opcode::$name => $mnemonic, )*
                    }
                }

                /// Number of leading lead-byte bits this opcode occupies.
                pub fn width(self) -> u32 {
                    match self {
                        $( Opcode::$name => $width, )*
                    }
                }

                pub fn pattern(self) -> u8 {
                    match self {
                        $( Opcode::$name => $pattern, )*
                    }
                }

                fn from_candidate(width: u32, candidate: u8) -> Option<Self> {
                    match (width, candidate) {
                        $( ($width, $pattern) => Some(Opcode::$name), )*
                        _ => None,
                    }
                }

                fn decode(self, window: &Window<'_>) -> Result<Instruction, DecodeError> {
                    match self {
                        $( Opcode::$name => [<decode_ $name:snake>](self, window), )*
                    }
                }
            }
        }
    };
}

define_opcodes! {
    MovRmReg { width: 6, pattern: 0b100010, mnemonic: "mov" },
    MovImmReg { width: 4, pattern: 0b1011, mnemonic: "mov" },
    MovImmRm { width: 7, pattern: 0b1100011, mnemonic: "mov" },
    MovMemAcc { width: 7, pattern: 0b1010000, mnemonic: "mov" },
    MovAccMem { width: 7, pattern: 0b1010001, mnemonic: "mov" },
}

impl Opcode {
    /// Matches the lead byte against the 7-, 6- and 4-bit opcode candidates, in that order.
    pub fn from_lead_byte(byte: Byte) -> Option<Self> {
        Self::from_candidate(7, byte.opcode::<7>())
            .or_else(|| Self::from_candidate(6, byte.opcode::<6>()))
            .or_else(|| Self::from_candidate(4, byte.opcode::<4>()))
    }
}

/// A decoded instruction: its operands in `destination, source` order and the number of bytes it occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    opcode: Opcode,
    operands: ArrayVec<Operand, 2>,
    size: usize,
}

impl Instruction {
    pub fn new(opcode: Opcode, destination: Operand, source: Operand, size: usize) -> Self {
        Self {
            opcode,
            operands: ArrayVec::from([destination, source]),
            size,
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn mnemonic(&self) -> &'static str {
        self.opcode.mnemonic()
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn destination(&self) -> Option<&Operand> {
        self.operands.first()
    }

    pub fn source(&self) -> Option<&Operand> {
        self.operands.get(1)
    }

    /// Number of bytes the encoding occupied.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())?;
        for (i, operand) in self.operands.iter().enumerate() {
            let separator = if i == 0 { " " } else { ", " };
            write!(f, "{separator}{operand}")?;
        }
        Ok(())
    }
}

/// Decodes the instruction at the start of `window`.
pub fn decode(window: &Window<'_>) -> Result<Instruction, DecodeError> {
    let lead = window.byte(0)?;
    let opcode = Opcode::from_lead_byte(lead).ok_or(DecodeError::UnrecognizedOpcode {
        byte: lead.0,
        offset: window.offset(),
    })?;

    opcode.decode(window)
}

/// `100010dw mod reg rm [disp-lo] [disp-hi]`
fn decode_mov_rm_reg(opcode: Opcode, window: &Window<'_>) -> Result<Instruction, DecodeError> {
    window.require(2)?;
    let lead = window.byte(0)?;
    let modrm = window.byte(1)?;
    let width = Width::from_w_bit(lead.wide());
    window.require(2 + rm_extra_size(window, modrm)?)?;

    let reg = Operand::Register(Register::new(modrm.reg(), width));
    let (rm, extra) = resolve_rm(window, modrm, width, 2)?;

    let (destination, source) = if lead.direction() { (reg, rm) } else { (rm, reg) };
    Ok(Instruction::new(opcode, destination, source, 2 + extra))
}

/// `1011wreg data [data-hi]`
fn decode_mov_imm_reg(opcode: Opcode, window: &Window<'_>) -> Result<Instruction, DecodeError> {
    let lead = window.byte(0)?;
    let width = Width::from_w_bit(lead.wide_imm_reg());
    window.require(1 + width.size())?;

    let destination = Operand::Register(Register::new(lead.embedded_reg(), width));
    let (value, size) = resolve_immediate(window, 1, width)?;

    Ok(Instruction::new(
        opcode,
        destination,
        Operand::Immediate(Immediate::new(value)),
        1 + size,
    ))
}

/// `1100011w mod 000 rm [disp-lo] [disp-hi] data [data-hi]`
fn decode_mov_imm_rm(opcode: Opcode, window: &Window<'_>) -> Result<Instruction, DecodeError> {
    let lead = window.byte(0)?;
    let width = Width::from_w_bit(lead.wide());
    window.require(2 + width.size())?;
    let modrm = window.byte(1)?;
    window.require(2 + rm_extra_size(window, modrm)? + width.size())?;

    let (destination, extra) = resolve_rm(window, modrm, width, 2)?;
    let (value, size) = resolve_immediate(window, 2 + extra, width)?;

    // A register destination already fixes the operand size.
    let immediate = if destination.is_memory() {
        Immediate::sized(value, width)
    } else {
        Immediate::new(value)
    };

    Ok(Instruction::new(
        opcode,
        destination,
        Operand::Immediate(immediate),
        2 + extra + size,
    ))
}

/// `1010000w addr-lo addr-hi`
fn decode_mov_mem_acc(opcode: Opcode, window: &Window<'_>) -> Result<Instruction, DecodeError> {
    decode_accumulator_move(opcode, window, false)
}

/// `1010001w addr-lo addr-hi`
fn decode_mov_acc_mem(opcode: Opcode, window: &Window<'_>) -> Result<Instruction, DecodeError> {
    decode_accumulator_move(opcode, window, true)
}

fn decode_accumulator_move(
    opcode: Opcode,
    window: &Window<'_>,
    to_memory: bool,
) -> Result<Instruction, DecodeError> {
    window.require(3)?;
    let width = Width::from_w_bit(window.byte(0)?.wide());

    let accumulator = Operand::Register(Register::new(0, width));
    let memory = Operand::Direct(window.u16(1)?);

    let (destination, source) = if to_memory {
        (memory, accumulator)
    } else {
        (accumulator, memory)
    };
    Ok(Instruction::new(opcode, destination, source, 3))
}
