use std::{env, path::PathBuf};

use log::LevelFilter;

use crate::{Error, Result};

/// Runtime options for the solver pipeline.
#[derive(Clone, Debug)]
pub struct SolverOptions {
    /// TSPLIB instance path. Empty or `-` means stdin.
    pub input: String,
    /// Output path for the JSON report. Empty or `-` means stdout.
    pub output: String,
    /// Wall-clock budget for local search in seconds. 0 means unlimited.
    pub time_limit: u64,
    /// Enable 2-opt moves.
    pub two_opt: bool,
    /// Enable or-opt moves.
    pub or_opt: bool,
    /// Structured logging level.
    pub log_level: LogLevel,
    /// Logging output format.
    pub log_format: LogFormat,
    /// Include timestamps in log lines.
    pub log_timestamp: bool,
    /// Optional output file path for logs. Empty means stderr.
    pub log_output: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            "off" => Ok(Self::Off),
            _ => Err(Error::invalid_input(format!(
                "Invalid value for --log-level: {value} (expected error|warn|info|debug|trace|off)"
            ))),
        }
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
            Self::Off => LevelFilter::Off,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(Error::invalid_input(format!(
                "Invalid value for --log-format: {value} (expected compact|pretty)"
            ))),
        }
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            time_limit: 0,
            two_opt: true,
            or_opt: true,
            log_level: LogLevel::Warn,
            log_format: LogFormat::Compact,
            log_timestamp: true,
            log_output: String::new(),
        }
    }
}

impl SolverOptions {
    pub fn from_args() -> Result<Self> {
        let cli_args: Vec<String> = env::args().skip(1).collect();
        Self::parse_from_iter(cli_args)
    }

    fn parse_from_iter<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        Self::apply_args(&mut options, args)?;
        Ok(options)
    }

    fn apply_args<I, S>(options: &mut Self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_owned())
            .peekable();

        while let Some(arg) = args.next() {
            if arg == "--help" || arg == "-h" {
                return Err(Error::invalid_input(Self::usage()));
            }

            let raw_name = if let Some(long) = arg.strip_prefix("--") {
                if long.is_empty() {
                    return Err(Error::invalid_input(format!(
                        "Invalid option name: {arg}\n\n{}",
                        Self::usage()
                    )));
                }
                long.to_owned()
            } else if let Some(short) = arg.strip_prefix('-')
                && !short.is_empty()
            {
                match short {
                    "i" => "input".to_owned(),
                    "o" => "output".to_owned(),
                    _ => {
                        return Err(Error::invalid_input(format!(
                            "Unknown option: {arg}\n\n{}",
                            Self::usage()
                        )));
                    }
                }
            } else {
                // Positional argument (or a lone `-`): the instance path.
                if !options.input.is_empty() {
                    return Err(Error::invalid_input(format!(
                        "Unexpected argument: {arg}\n\n{}",
                        Self::usage()
                    )));
                }
                options.input = arg;
                continue;
            };

            let (name, value) = Self::split_arg(&raw_name, &mut args);

            match name.as_str() {
                "input" => options.input = require_value(&name, value)?,
                "output" => options.output = require_value(&name, value)?,
                "log-output" => options.log_output = require_value(&name, value)?,
                "time-limit" => {
                    let raw = require_value(&name, value)?;
                    options.time_limit = raw.parse().map_err(|e| {
                        Error::invalid_input(format!("Invalid value for --{name}: {raw} ({e})"))
                    })?;
                }
                "log-level" => {
                    options.log_level = LogLevel::parse(&require_value(&name, value)?)?;
                }
                "log-format" => {
                    options.log_format = LogFormat::parse(&require_value(&name, value)?)?;
                }
                "two-opt" => {
                    options.two_opt = match value {
                        Some(v) => parse_bool(&name, &v)?,
                        None => true,
                    };
                }
                "no-two-opt" => {
                    reject_value(&name, value)?;
                    options.two_opt = false;
                }
                "or-opt" => {
                    options.or_opt = match value {
                        Some(v) => parse_bool(&name, &v)?,
                        None => true,
                    };
                }
                "no-or-opt" => {
                    reject_value(&name, value)?;
                    options.or_opt = false;
                }
                "log-timestamp" => {
                    options.log_timestamp = match value {
                        Some(v) => parse_bool(&name, &v)?,
                        None => true,
                    };
                }
                "no-log-timestamp" => {
                    reject_value(&name, value)?;
                    options.log_timestamp = false;
                }
                _ => {
                    return Err(Error::invalid_input(format!(
                        "Unknown option: --{name}\n\n{}",
                        Self::usage()
                    )));
                }
            }
        }
        Ok(())
    }

    fn split_arg(
        raw_name: &str,
        args: &mut std::iter::Peekable<impl Iterator<Item = String>>,
    ) -> (String, Option<String>) {
        if let Some((k, v)) = raw_name.split_once('=') {
            return (k.to_string(), Some(v.to_string()));
        }

        let value = match args.peek() {
            Some(next) if !next.starts_with("--") => args.next(),
            _ => None,
        };

        (raw_name.to_string(), value)
    }

    pub fn usage() -> &'static str {
        concat!(
            "Usage:\n",
            "  tsp-solve [options] <instance.tsp>\n",
            "  tsp-solve [options] --input instance.tsp\n",
            "  tsp-solve [options] < instance.tsp\n\n",
            "Options:\n",
            "  -i, --input <path>\n",
            "  -o, --output <path>\n",
            "  --time-limit <seconds>\n",
            "  --two-opt[=<bool>]\n",
            "  --no-two-opt\n",
            "  --or-opt[=<bool>]\n",
            "  --no-or-opt\n",
            "  --log-level <error|warn|info|debug|trace|off>\n",
            "  --log-format <compact|pretty>\n",
            "  --log-timestamp[=<bool>]\n",
            "  --no-log-timestamp\n",
            "  --log-output <path>\n",
            "  --help\n",
            "\n",
            "Examples:\n",
            "  tsp-solve berlin52.tsp\n",
            "  tsp-solve --input berlin52.tsp --output tour.json\n",
            "  tsp-solve --log-level=info --no-or-opt < berlin52.tsp\n",
            "  tsp-solve --time-limit 30 -o tour.json berlin52.tsp\n",
        )
    }

    pub fn input_path(&self) -> Option<PathBuf> {
        resolve_path(&self.input)
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        resolve_path(&self.output)
    }

    pub fn log_output_path(&self) -> Option<PathBuf> {
        resolve_path(&self.log_output)
    }
}

fn require_value(name: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| Error::invalid_input(format!("Missing value for --{name}")))
}

fn reject_value(name: &str, value: Option<String>) -> Result<()> {
    if value.is_some() {
        return Err(Error::invalid_input(format!(
            "Flag --{name} does not take a value"
        )));
    }
    Ok(())
}

/// Empty strings and `-` select the stdio default; anything else becomes an
/// absolute path.
fn resolve_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        return None;
    }
    std::path::absolute(raw).ok()
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::invalid_input(format!(
            "--{name} expects a boolean, got: {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;

    use super::{LogFormat, LogLevel, SolverOptions, parse_bool};

    #[test]
    fn parse_bool_accepts_common_true_values() {
        assert!(parse_bool("x", "true").expect("parse"));
        assert!(parse_bool("x", "1").expect("parse"));
        assert!(parse_bool("x", "YES").expect("parse"));
        assert!(parse_bool("x", "ON").expect("parse"));
    }

    #[test]
    fn parse_bool_accepts_common_false_values() {
        assert!(!parse_bool("x", "false").expect("parse"));
        assert!(!parse_bool("x", "0").expect("parse"));
        assert!(!parse_bool("x", "NO").expect("parse"));
        assert!(!parse_bool("x", "off").expect("parse"));
    }

    #[test]
    fn parse_bool_rejects_unknown_values() {
        let err = parse_bool("log-timestamp", "maybe").expect_err("invalid bool should fail");
        assert!(
            err.to_string()
                .contains("--log-timestamp expects a boolean, got: maybe")
        );
    }

    #[test]
    fn log_level_maps_to_expected_filter() {
        assert_eq!(LogLevel::Error.to_filter(), LevelFilter::Error);
        assert_eq!(LogLevel::Warn.to_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::Info.to_filter(), LevelFilter::Info);
        assert_eq!(LogLevel::Debug.to_filter(), LevelFilter::Debug);
        assert_eq!(LogLevel::Trace.to_filter(), LevelFilter::Trace);
        assert_eq!(LogLevel::Off.to_filter(), LevelFilter::Off);
    }

    #[test]
    fn parse_from_iter_applies_known_cli_options() {
        let options = SolverOptions::parse_from_iter([
            "--input=berlin52.tsp",
            "--output=tour.json",
            "--time-limit=30",
            "--two-opt=false",
            "--or-opt=false",
            "--log-level=debug",
            "--log-format=pretty",
            "--log-timestamp=false",
            "--log-output=run.log",
        ])
        .expect("parse options");

        assert_eq!(options.input, "berlin52.tsp");
        assert_eq!(options.output, "tour.json");
        assert_eq!(options.time_limit, 30);
        assert!(!options.two_opt);
        assert!(!options.or_opt);
        assert_eq!(options.log_level, LogLevel::Debug);
        assert_eq!(options.log_format, LogFormat::Pretty);
        assert!(!options.log_timestamp);
        assert_eq!(options.log_output, "run.log");
    }

    #[test]
    fn parse_from_iter_accepts_positional_instance_path() {
        let options = SolverOptions::parse_from_iter(["berlin52.tsp"]).expect("parse options");
        assert_eq!(options.input, "berlin52.tsp");
    }

    #[test]
    fn parse_from_iter_rejects_second_positional_argument() {
        let err = SolverOptions::parse_from_iter(["a.tsp", "b.tsp"])
            .expect_err("second positional should fail");
        assert!(err.to_string().contains("Unexpected argument: b.tsp"));
    }

    #[test]
    fn parse_from_iter_accepts_short_input_and_output() {
        let options =
            SolverOptions::parse_from_iter(["-i", "a.tsp", "-o", "out.json"]).expect("parse");
        assert_eq!(options.input, "a.tsp");
        assert_eq!(options.output, "out.json");
    }

    #[test]
    fn parse_from_iter_accepts_dash_as_stdin_marker() {
        let options = SolverOptions::parse_from_iter(["-"]).expect("parse");
        assert_eq!(options.input, "-");
        assert!(options.input_path().is_none());
    }

    #[test]
    fn parse_from_iter_accepts_no_two_opt_flag() {
        let options = SolverOptions::parse_from_iter(["--no-two-opt"]).expect("parse options");
        assert!(!options.two_opt);
        assert!(options.or_opt);
    }

    #[test]
    fn parse_from_iter_accepts_no_or_opt_flag() {
        let options = SolverOptions::parse_from_iter(["--no-or-opt"]).expect("parse options");
        assert!(!options.or_opt);
        assert!(options.two_opt);
    }

    #[test]
    fn parse_from_iter_rejects_no_flag_with_value() {
        let err = SolverOptions::parse_from_iter(["--no-or-opt=true"])
            .expect_err("expected flag value rejection");
        assert!(err.to_string().contains("does not take a value"));
    }

    #[test]
    fn parse_from_iter_rejects_unknown_option() {
        let err = SolverOptions::parse_from_iter(["--unknown-opt=1"])
            .expect_err("expected unknown option error");
        assert!(err.to_string().contains("Unknown option: --unknown-opt"));
    }

    #[test]
    fn parse_from_iter_rejects_invalid_time_limit() {
        let err = SolverOptions::parse_from_iter(["--time-limit=soon"])
            .expect_err("expected invalid value error");
        assert!(err.to_string().contains("Invalid value for --time-limit"));
    }

    #[test]
    fn parse_from_iter_requires_value_for_input() {
        let err =
            SolverOptions::parse_from_iter(["--input"]).expect_err("missing value should fail");
        assert!(err.to_string().contains("Missing value for --input"));
    }

    #[test]
    fn parse_from_iter_help_returns_usage_error() {
        let err =
            SolverOptions::parse_from_iter(["--help"]).expect_err("help should short-circuit");
        assert!(err.to_string().contains("Usage:"));
    }

    #[test]
    fn local_search_moves_default_to_enabled() {
        let options = SolverOptions::default();
        assert!(options.two_opt);
        assert!(options.or_opt);
        assert_eq!(options.time_limit, 0);
    }

    #[test]
    fn input_path_treats_empty_and_dash_as_stdin() {
        let options = SolverOptions::default();
        assert!(options.input_path().is_none());

        let options = SolverOptions {
            input: "-".to_string(),
            ..SolverOptions::default()
        };
        assert!(options.input_path().is_none());
    }

    #[test]
    fn output_path_returns_absolute_path_for_non_empty_value() {
        let options = SolverOptions {
            output: "out/tour.json".to_string(),
            ..SolverOptions::default()
        };
        let expected = std::path::absolute("out/tour.json").expect("absolute path");
        assert_eq!(options.output_path().expect("path should exist"), expected);
    }

    #[test]
    fn log_output_path_treats_empty_as_stderr() {
        let options = SolverOptions::default();
        assert!(options.log_output_path().is_none());
    }
}
