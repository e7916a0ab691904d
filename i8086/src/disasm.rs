use std::fmt;

use crate::{
    decoder::{DecodeError, Decoder},
    instruction::Instruction,
};

/// First line of every listing. The assembler needs it to pick 16-bit encodings.
pub const HEADER: &str = "bits 16";

/// One decoded instruction together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    pub offset: usize,
    pub bytes: &'a [u8],
    pub instruction: Instruction,
}

impl<'a> Line<'a> {
    /// Displays the instruction followed by a `; offset: bytes` comment.
    pub fn annotated(&self) -> Annotated<'_, 'a> {
        Annotated(self)
    }
}

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instruction)
    }
}

pub struct Annotated<'l, 'a>(&'l Line<'a>);

impl fmt::Display for Annotated<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.0;
        write!(f, "{line} ; {:#06x}:", line.offset)?;
        for byte in line.bytes {
            write!(f, " {byte:02x}")?;
        }
        Ok(())
    }
}

/// Decodes `input` from offset 0. Iteration ends at the end of the input or after the first error.
pub fn lines(input: &[u8]) -> impl Iterator<Item = Result<Line<'_>, DecodeError>> + '_ {
    Decoder::new(input).map(move |result| {
        result.map(|(offset, instruction)| Line {
            offset,
            bytes: &input[offset..offset + instruction.size()],
            instruction,
        })
    })
}

/// Disassembles the whole input into assembleable text.
pub fn disassemble(input: &[u8]) -> Result<String, DecodeError> {
    render(input, |line| line.to_string())
}

/// Like [`disassemble`], with each line's offset and raw bytes in a trailing comment.
pub fn disassemble_annotated(input: &[u8]) -> Result<String, DecodeError> {
    render(input, |line| line.annotated().to_string())
}

fn render(input: &[u8], format: impl Fn(&Line<'_>) -> String) -> Result<String, DecodeError> {
    let mut out = format!("{HEADER}\n\n");
    for line in lines(input) {
        out.push_str(&format(&line?));
        out.push('\n');
    }
    Ok(out)
}
