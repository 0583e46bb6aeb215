use crate::cli::Cli;
use crate::errors::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io::{self, Write};

const BIN_NAME: &str = "pstack";

/// Generate shell completions for the specified shell on stdout
pub fn generate_completions(shell: Shell) -> Result<()> {
    write_completions(shell, &mut io::stdout())
}

pub fn write_completions<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
    out.flush()?;
    Ok(())
}
