use arrayvec::ArrayVec;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    byte::{Byte, le_i16, le_u16},
    instruction::{self, Instruction},
};

/// The longest encoding any supported instruction form can have.
pub const MAX_INSTRUCTION_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognized opcode {byte:#04x} at offset {offset:#x}")]
    UnrecognizedOpcode { byte: u8, offset: usize },
    #[error("truncated instruction at offset {offset:#x}: needs {needed} bytes, have {bytes:02x?}")]
    TruncatedInstruction {
        offset: usize,
        needed: usize,
        bytes: ArrayVec<u8, MAX_INSTRUCTION_LEN>,
    },
    #[error("invalid {field} field {value:#b} at offset {offset:#x}")]
    InvalidField {
        field: &'static str,
        value: u8,
        offset: usize,
    },
}

impl DecodeError {
    pub fn offset(&self) -> usize {
        match *self {
            DecodeError::UnrecognizedOpcode { offset, .. }
            | DecodeError::TruncatedInstruction { offset, .. }
            | DecodeError::InvalidField { offset, .. } => offset,
        }
    }
}

/// Up to [`MAX_INSTRUCTION_LEN`] bytes starting at an instruction boundary, never past the end of the input.
#[derive(Debug, Copy, Clone)]
pub struct Window<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Window<'a> {
    pub fn new(input: &'a [u8], offset: usize) -> Self {
        let end = input.len().min(offset.saturating_add(MAX_INSTRUCTION_LEN));
        Self {
            bytes: input.get(offset..end).unwrap_or(&[]),
            offset,
        }
    }

    /// Offset of the first window byte in the whole input.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Fails with the full encoded length `len` when fewer bytes remain.
    pub fn require(&self, len: usize) -> Result<(), DecodeError> {
        if self.bytes.len() < len {
            return Err(self.truncated(len));
        }
        Ok(())
    }

    pub fn byte(&self, index: usize) -> Result<Byte, DecodeError> {
        self.bytes
            .get(index)
            .copied()
            .map(Byte)
            .ok_or_else(|| self.truncated(index + 1))
    }

    pub fn i8(&self, index: usize) -> Result<i8, DecodeError> {
        Ok(self.byte(index)?.0 as i8)
    }

    pub fn u16(&self, index: usize) -> Result<u16, DecodeError> {
        Ok(le_u16(self.byte(index)?, self.byte(index + 1)?))
    }

    pub fn i16(&self, index: usize) -> Result<i16, DecodeError> {
        Ok(le_i16(self.byte(index)?, self.byte(index + 1)?))
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::TruncatedInstruction {
            offset: self.offset,
            needed,
            bytes: self.bytes.iter().copied().collect(),
        }
    }
}

pub struct Decoder<'a> {
    input: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            failed: false,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    pub fn window(&self) -> Window<'a> {
        Window::new(self.input, self.offset)
    }

    /// Decodes the instruction at the cursor and advances past it.
    /// The cursor does not move when decoding fails.
    pub fn decode_instruction(&mut self) -> Result<Instruction, DecodeError> {
        let window = self.window();

        match instruction::decode(&window) {
            Ok(instruction) => {
                assert!(
                    instruction.size() > 0 && instruction.size() <= window.as_bytes().len(),
                    "decoded {instruction:?} with a size outside its window"
                );
                trace!(offset = self.offset, size = instruction.size(), "{instruction}");
                self.offset += instruction.size();
                Ok(instruction)
            }
            Err(err) => {
                debug!(offset = self.offset, %err, "decoding stopped");
                Err(err)
            }
        }
    }
}

/// Yields `(offset, instruction)` pairs until the input is exhausted.
/// A decode error is yielded once and ends the iteration.
impl Iterator for Decoder<'_> {
    type Item = Result<(usize, Instruction), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.is_at_end() {
            return None;
        }

        let offset = self.offset;
        let result = self.decode_instruction();
        self.failed = result.is_err();
        Some(result.map(|instruction| (offset, instruction)))
    }
}
