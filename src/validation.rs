//! Conversion and range checks for raw flag values.
//!
//! Flags are taken from the command line as strings so that an empty value
//! (`--temperature=`) can be told apart from a missing one and so that a bad
//! literal is reported back verbatim.

use crate::errors::GptError;

pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;
pub const DEFAULT_DAYS: i64 = 30;
pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 60;
pub const DEFAULT_LIMIT: i64 = 20;

pub fn parse_float(raw: &str) -> Result<f32, GptError> {
    raw.trim().parse::<f32>().map_err(|_| GptError::Conversion {
        input: raw.to_string(),
        target: "float",
    })
}

pub fn parse_int(raw: &str) -> Result<i64, GptError> {
    raw.trim().parse::<i64>().map_err(|_| GptError::Conversion {
        input: raw.to_string(),
        target: "int",
    })
}

/// Sampling temperature in [0, 2]; absent means [`DEFAULT_TEMPERATURE`].
pub fn temperature(raw: Option<&str>) -> Result<f32, GptError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TEMPERATURE);
    };
    if raw.is_empty() {
        return Err(GptError::validation("Empty temperature"));
    }
    let temp = parse_float(raw)?;
    // NaN fails this check too
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temp) {
        return Err(GptError::validation("Temperature must be between 0 and 2"));
    }
    Ok(temp)
}

/// Cost look-back window in [1, 60] days.
pub fn days(raw: Option<&str>) -> Result<i64, GptError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_DAYS);
    };
    if raw.is_empty() {
        return Err(GptError::validation("Days argument is empty"));
    }
    let days = parse_int(raw)?;
    if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
        return Err(GptError::validation(format!(
            "Days must be between {} and {}",
            MIN_DAYS, MAX_DAYS
        )));
    }
    Ok(days)
}

/// Listing limit, at least 1.
pub fn limit(raw: Option<&str>) -> Result<i64, GptError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_LIMIT);
    };
    if raw.is_empty() {
        return Err(GptError::validation("Limit argument is empty"));
    }
    let limit = parse_int(raw)?;
    if limit < 1 {
        return Err(GptError::validation(
            "Limit must be greater than or equal to 1",
        ));
    }
    Ok(limit)
}

/// Reject `Some("")` with `msg`; pass everything else through.
pub fn reject_empty<'a>(value: Option<&'a str>, msg: &str) -> Result<Option<&'a str>, GptError> {
    match value {
        Some("") => Err(GptError::validation(msg)),
        other => Ok(other),
    }
}
