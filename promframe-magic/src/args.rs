//! Argument lines of the cell commands.

use clap::Parser;
use promframe::{DurationInput, TimestampInput};

/// `prometheus_query <url> [output] [--time T] [--timeout D]`
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "prometheus_query")]
pub struct QueryArgs {
    /// Prometheus host (URL)
    pub url: String,
    /// Output variable
    pub output: Option<String>,
    /// Evaluation timestamp (`rfc3339 | unix_timestamp`)
    #[arg(long, short = 't')]
    pub time: Option<String>,
    /// Evaluation timeout
    #[arg(long, short = 'T')]
    pub timeout: Option<String>,
}

/// `prometheus_query_range <url> <start> <end> <step> [output] [--timeout D]`
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "prometheus_query_range")]
pub struct QueryRangeArgs {
    /// Prometheus host (URL)
    pub url: String,
    /// Start timestamp (`rfc3339 | unix_timestamp`)
    pub start: String,
    /// End timestamp (`rfc3339 | unix_timestamp`)
    pub end: String,
    /// Query resolution step width in `duration` format or float number of seconds
    pub step: String,
    /// Output variable
    pub output: Option<String>,
    /// Evaluation timeout
    #[arg(long, short = 'T')]
    pub timeout: Option<String>,
}

/// `prometheus_query_range_now <url> <duration> <step> [output] [--timeout D]`
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "prometheus_query_range_now")]
pub struct QueryRangeNowArgs {
    /// Prometheus host (URL)
    pub url: String,
    /// Query window in `duration` format or float number of seconds
    pub duration: String,
    /// Query resolution step width in `duration` format or float number of seconds
    pub step: String,
    /// Output variable
    pub output: Option<String>,
    /// Evaluation timeout
    #[arg(long, short = 'T')]
    pub timeout: Option<String>,
}

/// Parse a whitespace-separated argument line for the command `name`.
pub fn parse_line<P: Parser>(name: &str, line: &str) -> Result<P, clap::Error> {
    P::try_parse_from(std::iter::once(name).chain(line.split_whitespace()))
}

fn number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numbers are Unix seconds, anything else goes to the server verbatim.
pub fn timestamp_arg(raw: &str) -> TimestampInput {
    match number(raw) {
        Some(secs) => TimestampInput::Unix(secs),
        None => TimestampInput::Rfc3339(raw.to_string()),
    }
}

/// Numbers are seconds, anything else is a duration literal.
pub fn duration_arg(raw: &str) -> DurationInput {
    match number(raw) {
        Some(secs) => DurationInput::Seconds(secs),
        None => DurationInput::Literal(raw.to_string()),
    }
}
