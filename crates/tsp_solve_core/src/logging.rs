//! Logger setup for the solver pipeline.
//!
//! Pipeline stages log `component: message key={val}` one-liners and already
//! name their component, so the formatter stays minimal: a padded level tag,
//! an optional millisecond timestamp, and the message. The pretty format
//! adds the module target for debugging.

use std::fs::File;
use std::io::Write;

use env_logger::fmt::Formatter;
use env_logger::{Builder, Target, WriteStyle};
use log::Record;

use crate::options::{LogFormat, SolverOptions};
use crate::{Error, Result};

pub fn init_logger(options: &SolverOptions) -> Result<()> {
    let format = options.log_format;
    let timestamp = options.log_timestamp;

    Builder::new()
        .filter_level(options.log_level.to_filter())
        .write_style(WriteStyle::Never)
        .target(log_target(options)?)
        .format(move |buf, record| write_record(buf, record, format, timestamp))
        .try_init()
        .map_err(|e| Error::other(format!("logger init failed: {e}")))
}

fn log_target(options: &SolverOptions) -> Result<Target> {
    let Some(path) = options.log_output_path() else {
        return Ok(Target::Stderr);
    };
    let file = File::create(&path).map_err(|e| {
        Error::other(format!(
            "failed to create log output file {}: {e}",
            path.display()
        ))
    })?;
    Ok(Target::Pipe(Box::new(file)))
}

fn write_record(
    buf: &mut Formatter,
    record: &Record<'_>,
    format: LogFormat,
    timestamp: bool,
) -> std::io::Result<()> {
    if timestamp {
        write!(buf, "{} ", buf.timestamp_millis())?;
    }

    match format {
        LogFormat::Compact => writeln!(buf, "{:5} {}", record.level(), record.args()),
        LogFormat::Pretty => writeln!(
            buf,
            "{:5} [{}] {}",
            record.level(),
            record.target(),
            record.args()
        ),
    }
}
