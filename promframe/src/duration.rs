//! Prometheus duration literals (`5m`, `2d`, ...).
//!
//! Only the single-unit form is understood. A year is a fixed 365 days;
//! there is no calendar awareness.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

const SECOND: u64 = 1;
const MINUTE: u64 = 60;
const HOUR: u64 = 3_600;
const DAY: u64 = 86_400;
const WEEK: u64 = 604_800;
const YEAR: u64 = 31_536_000;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]+)([smhdwy])$").expect("static regex"))
}

/// Seconds per unit suffix.
fn unit_seconds(suffix: &str) -> Option<u64> {
    match suffix {
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        "d" => Some(DAY),
        "w" => Some(WEEK),
        "y" => Some(YEAR),
        _ => None,
    }
}

/// Parse a duration literal into whole seconds.
pub fn parse_duration(text: &str) -> Result<u64> {
    let invalid = || Error::InvalidDuration(text.to_string());

    let caps = pattern().captures(text).ok_or_else(invalid)?;
    let count: u64 = caps[1].parse().map_err(|_| invalid())?;
    let unit = unit_seconds(&caps[2]).ok_or_else(invalid)?;

    count.checked_mul(unit).ok_or_else(invalid)
}
