//! Request parameter normalization.
//!
//! Timestamps and durations arrive in several forms. Each form is an explicit
//! variant here and is turned into a wire value without touching the input.

use std::fmt;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::duration::parse_duration;
use crate::error::{Error, Result};

// ------------------------------------------------------------------ //
//  Inputs                                                             //
// ------------------------------------------------------------------ //

/// A point in time as accepted by the query API.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampInput {
    /// RFC-3339 string, sent verbatim.
    Rfc3339(String),
    /// Unix epoch seconds.
    Unix(f64),
    DateTime(DateTime<Utc>),
}

impl From<&str> for TimestampInput {
    fn from(s: &str) -> Self {
        TimestampInput::Rfc3339(s.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(s: String) -> Self {
        TimestampInput::Rfc3339(s)
    }
}

impl From<f64> for TimestampInput {
    fn from(secs: f64) -> Self {
        TimestampInput::Unix(secs)
    }
}

impl From<i64> for TimestampInput {
    fn from(secs: i64) -> Self {
        TimestampInput::Unix(secs as f64)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimestampInput {
    fn from(dt: DateTime<Tz>) -> Self {
        TimestampInput::DateTime(dt.with_timezone(&Utc))
    }
}

impl TimestampInput {
    /// Wire value: structured times become epoch seconds, the rest pass through.
    pub fn to_param(&self) -> ParamValue {
        match self {
            TimestampInput::Rfc3339(s) => ParamValue::Text(s.clone()),
            TimestampInput::Unix(secs) => ParamValue::Number(*secs),
            TimestampInput::DateTime(dt) => ParamValue::Number(epoch_seconds(dt)),
        }
    }
}

/// A span of time as accepted by the query API.
#[derive(Debug, Clone, PartialEq)]
pub enum DurationInput {
    /// Duration literal such as `5m`. The server parses it.
    Literal(String),
    Seconds(f64),
    Elapsed(TimeDelta),
}

impl From<&str> for DurationInput {
    fn from(s: &str) -> Self {
        DurationInput::Literal(s.to_string())
    }
}

impl From<String> for DurationInput {
    fn from(s: String) -> Self {
        DurationInput::Literal(s)
    }
}

impl From<f64> for DurationInput {
    fn from(secs: f64) -> Self {
        DurationInput::Seconds(secs)
    }
}

impl From<TimeDelta> for DurationInput {
    fn from(delta: TimeDelta) -> Self {
        DurationInput::Elapsed(delta)
    }
}

/// Fails for spans beyond what [`TimeDelta`] can hold.
impl TryFrom<std::time::Duration> for DurationInput {
    type Error = Error;

    fn try_from(d: std::time::Duration) -> Result<Self> {
        TimeDelta::from_std(d)
            .map(DurationInput::Elapsed)
            .map_err(|_| Error::InvalidDuration(format!("{d:?}")))
    }
}

impl DurationInput {
    /// Wire value: structured spans become total seconds, the rest pass through.
    pub fn to_param(&self) -> ParamValue {
        match self {
            DurationInput::Literal(s) => ParamValue::Text(s.clone()),
            DurationInput::Seconds(secs) => ParamValue::Number(*secs),
            DurationInput::Elapsed(delta) => ParamValue::Number(total_seconds(delta)),
        }
    }

    /// Resolve to seconds locally. Literals go through [`parse_duration`].
    pub fn seconds(&self) -> Result<f64> {
        let secs = match self {
            DurationInput::Literal(s) => parse_duration(s)? as f64,
            DurationInput::Seconds(secs) => *secs,
            DurationInput::Elapsed(delta) => total_seconds(delta),
        };
        if !secs.is_finite() {
            return Err(Error::InvalidDuration(secs.to_string()));
        }
        Ok(secs)
    }

    /// Resolve to a [`TimeDelta`] for date arithmetic.
    pub fn to_time_delta(&self) -> Result<TimeDelta> {
        if let DurationInput::Elapsed(delta) = self {
            return Ok(*delta);
        }
        let secs = self.seconds()?;
        let nanos = (secs * 1e9).round();
        if nanos.abs() >= i64::MAX as f64 {
            return Err(Error::InvalidDuration(secs.to_string()));
        }
        Ok(TimeDelta::nanoseconds(nanos as i64))
    }
}

fn epoch_seconds(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) / 1e9
}

fn total_seconds(delta: &TimeDelta) -> f64 {
    // subsec_nanos carries the sign of the delta.
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

// ------------------------------------------------------------------ //
//  Wire values                                                        //
// ------------------------------------------------------------------ //

/// A single query-string value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Ordered query parameters for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    pairs: Vec<(String, ParamValue)>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: ParamValue) {
        self.pairs.push((name.to_string(), value));
    }

    /// Look up the first value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Rendered `(name, value)` pairs ready for URL encoding.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

// ------------------------------------------------------------------ //
//  Builders                                                           //
// ------------------------------------------------------------------ //

/// Parameters for `api/v1/query`.
pub fn instant_params(
    expr: &str,
    time: Option<&TimestampInput>,
    timeout: Option<&DurationInput>,
) -> RequestParams {
    let mut params = RequestParams::new();
    params.push("query", ParamValue::Text(expr.to_string()));
    if let Some(time) = time {
        params.push("time", time.to_param());
    }
    if let Some(timeout) = timeout {
        params.push("timeout", timeout.to_param());
    }
    params
}

/// Parameters for `api/v1/query_range`.
pub fn range_params(
    expr: &str,
    start: &TimestampInput,
    end: &TimestampInput,
    step: &DurationInput,
    timeout: Option<&DurationInput>,
) -> RequestParams {
    let mut params = RequestParams::new();
    params.push("query", ParamValue::Text(expr.to_string()));
    params.push("start", start.to_param());
    params.push("end", end.to_param());
    params.push("step", step.to_param());
    if let Some(timeout) = timeout {
        params.push("timeout", timeout.to_param());
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn datetime_becomes_epoch_seconds() {
        let dt = Utc.timestamp_opt(1_609_459_200, 500_000_000).unwrap();
        let input = TimestampInput::from(dt);
        assert_eq!(input.to_param(), ParamValue::Number(1_609_459_200.5));
    }

    #[test]
    fn offset_datetime_is_converted_to_utc() {
        let offset = FixedOffset::east_opt(3_600).unwrap();
        let dt = offset.with_ymd_and_hms(2021, 1, 1, 1, 0, 0).unwrap();
        assert_eq!(
            TimestampInput::from(dt).to_param(),
            ParamValue::Number(1_609_459_200.0)
        );
    }

    #[test]
    fn string_and_number_timestamps_pass_through() {
        let rfc = TimestampInput::from("2021-01-01T00:00:00Z");
        assert_eq!(rfc.to_param(), ParamValue::Text("2021-01-01T00:00:00Z".into()));
        assert_eq!(TimestampInput::from(12.25).to_param(), ParamValue::Number(12.25));
        assert_eq!(TimestampInput::from(7_i64).to_param(), ParamValue::Number(7.0));
    }

    #[test]
    fn elapsed_becomes_total_seconds() {
        let input = DurationInput::from(TimeDelta::milliseconds(90_500));
        assert_eq!(input.to_param(), ParamValue::Number(90.5));

        let std_input = DurationInput::try_from(std::time::Duration::from_millis(1_500)).unwrap();
        assert_eq!(std_input.to_param(), ParamValue::Number(1.5));
    }

    #[test]
    fn oversized_std_duration_is_rejected() {
        let err = DurationInput::try_from(std::time::Duration::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidDuration(_)));
    }

    #[test]
    fn negative_elapsed_keeps_fraction_sign() {
        let input = DurationInput::from(TimeDelta::milliseconds(-1_500));
        assert_eq!(input.to_param(), ParamValue::Number(-1.5));
    }

    #[test]
    fn literal_duration_is_not_parsed_for_the_wire() {
        let input = DurationInput::from("1h30m");
        assert_eq!(input.to_param(), ParamValue::Text("1h30m".into()));
    }

    #[test]
    fn seconds_parses_literals() {
        assert_eq!(DurationInput::from("1h").seconds().unwrap(), 3_600.0);
        assert_eq!(DurationInput::from(2.5).seconds().unwrap(), 2.5);
        assert!(matches!(
            DurationInput::from("soon").seconds(),
            Err(Error::InvalidDuration(_))
        ));
        assert!(matches!(
            DurationInput::from(f64::NAN).seconds(),
            Err(Error::InvalidDuration(_))
        ));
    }

    #[test]
    fn to_time_delta_from_literal() {
        let delta = DurationInput::from("5m").to_time_delta().unwrap();
        assert_eq!(delta, TimeDelta::seconds(300));
    }

    #[test]
    fn number_rendering() {
        assert_eq!(ParamValue::Number(1_609_459_200.0).to_string(), "1609459200");
        assert_eq!(ParamValue::Number(0.25).to_string(), "0.25");
    }

    #[test]
    fn instant_params_only_include_given_fields() {
        let params = instant_params("up", None, None);
        assert_eq!(params.to_query(), vec![("query".to_string(), "up".to_string())]);

        let time = TimestampInput::from(100.0);
        let timeout = DurationInput::from("30s");
        let params = instant_params("up", Some(&time), Some(&timeout));
        assert_eq!(
            params.to_query(),
            vec![
                ("query".to_string(), "up".to_string()),
                ("time".to_string(), "100".to_string()),
                ("timeout".to_string(), "30s".to_string()),
            ]
        );
    }

    #[test]
    fn range_params_are_ordered() {
        let params = range_params(
            "rate(x[5m])",
            &TimestampInput::from("2021-01-01T00:00:00Z"),
            &TimestampInput::from(1_609_462_800.0),
            &DurationInput::from(TimeDelta::seconds(60)),
            None,
        );
        let names: Vec<String> = params.to_query().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["query", "start", "end", "step"]);
        assert_eq!(params.get("step"), Some(&ParamValue::Number(60.0)));
    }
}
