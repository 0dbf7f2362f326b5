//! Interfaz de línea de comandos de `ccode`.
//!
//! Todo lo que no es el `main` vive aquí para poder probarlo con buffers en
//! lugar de stdout/stderr.

pub mod args;
pub mod commands;
pub mod logging;
pub mod progress;

use std::{ffi::OsString, io::Write};

use clap::{
    CommandFactory, Parser,
    error::{ContextKind, ContextValue, ErrorKind},
};

pub use args::{BatchArgs, Cli, Commands, CreateArgs};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

/// Interpreta los argumentos. En `Err` viene el código de salida, con el
/// mensaje ya escrito.
pub fn parse<I, T>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> Result<Cli, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(e) => Err(report_parse_error(&e, out, err)),
    }
}

/// Ejecuta un comando ya interpretado y devuelve el código de salida.
pub fn execute(cli: Cli, out: &mut dyn Write, err: &mut dyn Write) -> u8 {
    let Some(command) = cli.command else {
        let _ = writeln!(out, "{}", Cli::command().render_help());
        return EXIT_OK;
    };

    match command {
        Commands::Create(args) => commands::create(&args, cli.config.as_deref(), out, err),
        Commands::Batch(args) => commands::batch(&args, cli.config.as_deref(), out, err),
        Commands::Selftest => commands::selftest(out, err),
    }
}

/// `parse` + `execute`, sin instalar logging.
pub fn run<I, T>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match parse(args, out, err) {
        Ok(cli) => execute(cli, out, err),
        Err(code) => code,
    }
}

fn report_parse_error(e: &clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> u8 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(out, "{}", e.render());
            EXIT_OK
        }
        ErrorKind::MissingRequiredArgument => {
            let name = match e.get(ContextKind::InvalidArg) {
                Some(ContextValue::Strings(names)) => names.first().cloned(),
                Some(ContextValue::String(name)) => Some(name.clone()),
                _ => None,
            }
            .map(|n| n.trim_matches(|c| c == '<' || c == '>').to_string())
            .unwrap_or_default();

            let _ = writeln!(err, "Missing argument '{name}'");
            EXIT_USAGE
        }
        _ => {
            let _ = write!(err, "{}", e.render());
            u8::try_from(e.exit_code()).unwrap_or(EXIT_USAGE)
        }
    }
}
