//! Utility functions for durations and messages.

mod duration;

pub use duration::{parse_duration, DurationError};

use chrono::{DateTime, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Formats `count` with `noun`, adding an `s` unless the count is one.
///
/// # Examples
///
/// ```
/// use cichain::utils::pluralize;
///
/// assert_eq!(pluralize(1, "job"), "1 job");
/// assert_eq!(pluralize(3, "pipeline"), "3 pipelines");
/// ```
#[must_use]
pub fn pluralize(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(0, "job"), "0 jobs");
        assert_eq!(pluralize(1, "job"), "1 job");
        assert_eq!(pluralize(2, "job"), "2 jobs");
    }
}
