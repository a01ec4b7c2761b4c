//! Binary entry point: parse the CLI, build the command pipeline, and
//! drive the executor over stdin or each input file.

use clap::Parser;

use vsed::buffer::ByteBuffer;
use vsed::cli::Cli;
use vsed::error::CliError;
use vsed::executor::{self, ExecutionOptions};
use vsed::io;
use vsed::parser;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    std::process::exit(run(&cli));
}

/// Runs the whole invocation and returns the process exit code (§6/§7).
/// Script/regex parse failures are fatal for the entire process (the
/// pipeline doesn't exist yet, so there's nothing left to run per file);
/// an `IoError` on one input file is fatal only for that file — the
/// remaining files still get processed, and the process exits 2 if any
/// file failed.
fn run(cli: &Cli) -> i32 {
    let (script_text, files) = match cli.resolve_script_and_files() {
        Ok(v) => v,
        Err(err) => {
            eprintln!("vsed: {err}");
            return err.exit_code();
        }
    };
    let commands = match parser::parse_script_with_dialect(&script_text, cli.extended_by_default()) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("vsed: {err}");
            return CliError::from(err).exit_code();
        }
    };

    let opts = ExecutionOptions {
        suppress_auto_print: cli.quiet,
        backend: cli.backend_preference(),
    };

    if files.is_empty() {
        return match run_one(None, cli, &commands, opts) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("vsed: {err}");
                err.exit_code()
            }
        };
    }

    let mut exit_code = 0;
    for path in &files {
        log::debug!("processing {}", path.display());
        if let Err(err) = run_one(Some(path), cli, &commands, opts) {
            eprintln!("vsed: {err}");
            exit_code = err.exit_code();
        }
    }
    exit_code
}

fn run_one(
    path: Option<&std::path::Path>,
    cli: &Cli,
    commands: &[vsed::command::Command],
    opts: ExecutionOptions,
) -> Result<(), CliError> {
    let bytes = io::read_input(path)?;
    let buffer = ByteBuffer::new(bytes);
    let result = executor::run(commands, &buffer, opts)?;
    match path {
        Some(p) if cli.in_place => io::write_in_place(p, &result),
        _ => io::write_stdout(&result),
    }
}
