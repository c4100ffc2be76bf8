//! Human duration parsing for job `timeout:` values.
//!
//! Accepts a bare number of seconds (`"3600"`) or a sequence of
//! number/unit pairs (`"1h 30m"`, `"1 hour 30 minutes"`, `"1.5h"`).

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors that can occur during duration parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    /// The duration string is empty.
    #[error("Empty duration string")]
    EmptyString,

    /// The string contains text that is not a number/unit pair.
    #[error("Invalid duration: {0}")]
    InvalidFormat(String),

    /// The unit is not recognized.
    #[error("Unknown duration unit: {0}")]
    UnknownUnit(String),
}

#[allow(clippy::expect_used)]
fn component_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([a-z]+)?").expect("valid duration regex"))
}

fn unit_seconds(unit: &str) -> Option<f64> {
    match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1.0),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(3_600.0),
        "d" | "day" | "days" => Some(86_400.0),
        "w" | "wk" | "wks" | "week" | "weeks" => Some(604_800.0),
        _ => None,
    }
}

/// Parses a human duration into whole seconds.
///
/// # Examples
///
/// ```
/// use cichain::utils::parse_duration;
///
/// assert_eq!(parse_duration("1m 3s").unwrap(), 63);
/// assert_eq!(parse_duration("2 hours").unwrap(), 7200);
/// ```
///
/// # Errors
///
/// Returns [`DurationError`] if any part of the input is not a number/unit pair.
pub fn parse_duration(input: &str) -> Result<u64, DurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::EmptyString);
    }

    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Ok(seconds);
    }

    let mut total = 0.0_f64;
    let mut consumed = 0;

    for caps in component_regex().captures_iter(trimmed) {
        let Some(whole) = caps.get(0) else { continue };
        if !trimmed[consumed..whole.start()].trim().is_empty() {
            return Err(DurationError::InvalidFormat(input.to_string()));
        }
        consumed = whole.end();

        let amount: f64 = caps[1]
            .parse()
            .map_err(|_| DurationError::InvalidFormat(input.to_string()))?;
        let multiplier = match caps.get(2) {
            Some(unit) => unit_seconds(unit.as_str())
                .ok_or_else(|| DurationError::UnknownUnit(unit.as_str().to_string()))?,
            None => 1.0,
        };
        total += amount * multiplier;
    }

    if consumed == 0 || !trimmed[consumed..].trim().is_empty() {
        return Err(DurationError::InvalidFormat(input.to_string()));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(total.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_seconds() {
        assert_eq!(parse_duration("3600").unwrap(), 3600);
        assert_eq!(parse_duration(" 42 ").unwrap(), 42);
    }

    #[test]
    fn test_compound_durations() {
        assert_eq!(parse_duration("1m 3s").unwrap(), 63);
        assert_eq!(parse_duration("1h 30m").unwrap(), 5400);
        assert_eq!(parse_duration("1h30m").unwrap(), 5400);
        assert_eq!(parse_duration("1 hour 30 minutes").unwrap(), 5400);
        assert_eq!(parse_duration("2 days").unwrap(), 172_800);
    }

    #[test]
    fn test_fractional_units() {
        assert_eq!(parse_duration("1.5h").unwrap(), 5400);
    }

    #[test]
    fn test_invalid_durations() {
        assert_eq!(parse_duration(""), Err(DurationError::EmptyString));
        assert!(matches!(
            parse_duration("not-a-number"),
            Err(DurationError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_duration("10 parsecs"),
            Err(DurationError::UnknownUnit(_))
        ));
        assert!(matches!(
            parse_duration("1h and a bit"),
            Err(DurationError::UnknownUnit(_) | DurationError::InvalidFormat(_))
        ));
    }
}
