use std::io::Write;

use anyhow::Context;
use i8086::disasm::{HEADER, lines};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Style {
    Plain,
    /// Each line carries a `; offset: bytes` comment.
    Annotated,
}

/// Writes the listing for `bytes` as instructions are decoded. Lines before a decode error are still written.
pub fn disasm(bytes: &[u8], style: Style, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "{HEADER}\n")?;

    for line in lines(bytes) {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                out.flush()?;
                return Err(err).context("stopping due to decoder error");
            }
        };

        match style {
            Style::Plain => writeln!(out, "{line}")?,
            Style::Annotated => writeln!(out, "{}", line.annotated())?,
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use i8086::DecodeError;

    fn run(bytes: &[u8], style: Style) -> (String, anyhow::Result<()>) {
        let mut out = Vec::new();
        let result = disasm(bytes, style, &mut out);
        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn plain_listing() {
        let (text, result) = run(&[0x89, 0xD9, 0xB1, 0x0C], Style::Plain);
        result.unwrap();
        assert_eq!(text, "bits 16\n\nmov cx, bx\nmov cl, 12\n");
    }

    #[test]
    fn annotated_listing() {
        let (text, result) = run(&[0xB1, 0x0C], Style::Annotated);
        result.unwrap();
        assert_eq!(text, "bits 16\n\nmov cl, 12 ; 0x0000: b1 0c\n");
    }

    #[test]
    fn keeps_lines_before_error() {
        let (text, result) = run(&[0x89, 0xD9, 0xF4, 0x89, 0xD9], Style::Plain);
        assert_eq!(text, "bits 16\n\nmov cx, bx\n");

        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<DecodeError>(),
            Some(&DecodeError::UnrecognizedOpcode { byte: 0xF4, offset: 2 })
        );
    }
}
