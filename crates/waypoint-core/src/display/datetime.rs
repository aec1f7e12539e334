//! Timestamp formatting in the system timezone.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// Formats a `Timestamp` as `YYYY-MM-DD HH:MM:SS TZ` in the system timezone.
///
/// Stored timestamps are always UTC; this wrapper is only for human output.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .to_zoned(TimeZone::system())
                .strftime("%Y-%m-%d %H:%M:%S %Z")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_datetime_shape() {
        let ts = Timestamp::from_second(1_640_995_200).unwrap();
        let text = LocalDateTime(&ts).to_string();

        // Date and time components are always present, the zone varies by host.
        let mut parts = text.splitn(3, ' ');
        assert_eq!(parts.next().map(str::len), Some(10));
        assert_eq!(parts.next().map(str::len), Some(8));
        assert!(parts.next().is_some_and(|zone| !zone.is_empty()));
    }
}
