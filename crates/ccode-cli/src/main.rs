use std::{io, process::ExitCode};

use ccode_cli::{execute, logging::init_logging, parse};

fn main() -> ExitCode {
    let mut out = io::stdout();
    let mut err = io::stderr();

    let cli = match parse(std::env::args_os(), &mut out, &mut err) {
        Ok(cli) => cli,
        Err(code) => return ExitCode::from(code),
    };

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Warning: {e:#}");
    }

    ExitCode::from(execute(cli, &mut out, &mut err))
}
