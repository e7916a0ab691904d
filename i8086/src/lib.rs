pub mod byte;
pub mod decoder;
pub mod disasm;
pub mod instruction;
pub mod operand;
pub mod tables;

pub use decoder::{DecodeError, Decoder};
pub use disasm::disassemble;
pub use instruction::Instruction;
