//! Logger setup.
//!
//! Everything in the crate logs through the `log` facade. The binary installs a
//! `fern` dispatcher that timestamps each line and writes to stderr, plus a log
//! file when one is configured.

use std::path::Path;

use crate::error::Result;

/// Formats one record as `[HH:MM:SS.mmm LEVEL target] message`.
fn format_line(
    out: fern::FormatCallback,
    message: &std::fmt::Arguments,
    record: &log::Record,
) {
    out.finish(format_args!(
        "[{} {:<5} {}] {}",
        chrono::Local::now().format("%H:%M:%S%.3f"),
        record.level(),
        record.target(),
        message
    ))
}

/// Installs the global logger. Can only succeed once per process.
pub fn init(level: log::LevelFilter, file: Option<&Path>) -> Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(format_line)
        .level(level)
        .chain(std::io::stderr());

    if let Some(path) = file {
        dispatch = dispatch.chain(fern::log_file(path).map_err(fern::InitError::Io)?);
    }

    dispatch.apply().map_err(fern::InitError::from)?;
    Ok(())
}

/// Parses a level name from the config, falling back to `Info`.
pub fn parse_level(name: &str) -> log::LevelFilter {
    name.parse().unwrap_or_else(|_| {
        eprintln!("Unknown log level {name:?}, using info");
        log::LevelFilter::Info
    })
}
