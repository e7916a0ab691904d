use std::{fs, io};

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::Args;

mod args;
mod disasm;

fn main() -> anyhow::Result<()> {
    let Args {
        verbose,
        annotate,
        input,
    } = Args::parse()?;

    init_logging(verbose);

    let bytes =
        fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    debug!(path = %input.display(), len = bytes.len(), "loaded input");

    let style = if annotate {
        disasm::Style::Annotated
    } else {
        disasm::Style::Plain
    };

    disasm::disasm(&bytes, style, &mut io::stdout().lock())
        .with_context(|| format!("failed to disassemble {}", input.display()))
}

/// Logs go to stderr so the listing on stdout stays assembleable.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}
