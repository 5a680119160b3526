#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};

use typecodec::cli::args::CliArgs;
use typecodec::cli::{driver, reporter::Reporter};

const EXIT_SUCCESS: i32 = 0;
const EXIT_PROBLEMS: i32 = 1;

fn main() -> Result<()> {
    // Initialize tracing if TYPECODEC_LOG or RUST_LOG is set (zero cost otherwise).
    // Supports TYPECODEC_LOG_FORMAT=tree|json|text (see src/tracing_config.rs).
    typecodec::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let outcome = driver::run(&args, &cwd)?;

    if !outcome.output.is_empty() {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(outcome.output.as_bytes())
            .context("failed to write output")?;
        stdout.flush().context("failed to write output")?;
    }

    if !outcome.problems.is_empty() {
        let color = !args.no_color && std::io::stderr().is_terminal();
        let reporter = Reporter::new(color);
        eprintln!("{}", reporter.render(&outcome.problems));
        eprintln!();
        eprintln!("{}", reporter.summary(&outcome.problems));
    }

    let code = if outcome.has_errors() { EXIT_PROBLEMS } else { EXIT_SUCCESS };
    std::process::exit(code);
}
