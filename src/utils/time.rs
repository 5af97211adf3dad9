use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Layout of the TIME column: nanosecond precision, explicit UTC offset.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f %z";

/// Formats a modification time for the TIME column.
#[must_use]
pub fn format_mtime(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_format_epoch() {
        assert_eq!(
            format_mtime(UNIX_EPOCH),
            "1970-01-01 00:00:00.000000000 +0000"
        );
    }

    #[test]
    fn test_format_keeps_nanoseconds() {
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        assert_eq!(format_mtime(time), "2023-11-14 22:13:20.123456789 +0000");
    }
}
