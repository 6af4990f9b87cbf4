//! Human-readable times and counts for the results screen.

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const CENTISECONDS_PER_SECOND: u64 = 100;

/// `H:MM:SS`, `M:SS` or plain seconds, whichever is shortest.
pub fn format_seconds(total_seconds: u64, always_show_minutes: bool) -> String {
    let hours = total_seconds / SECONDS_PER_HOUR;
    let remaining = total_seconds % SECONDS_PER_HOUR;
    let minutes = remaining / SECONDS_PER_MINUTE;
    let seconds = remaining % SECONDS_PER_MINUTE;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else if always_show_minutes || minutes > 0 {
        format!("{minutes}:{seconds:02}")
    } else {
        seconds.to_string()
    }
}

/// Seconds as [`format_seconds`] followed by two decimal places.
pub fn format_centiseconds(total_centiseconds: u64) -> String {
    let seconds = total_centiseconds / CENTISECONDS_PER_SECOND;
    let centiseconds = total_centiseconds % CENTISECONDS_PER_SECOND;
    format!("{}.{centiseconds:02}", format_seconds(seconds, false))
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(7, false), "7");
        assert_eq!(format_seconds(7, true), "0:07");
        assert_eq!(format_seconds(75, false), "1:15");
        assert_eq!(format_seconds(3_725, false), "1:02:05");
    }

    #[test]
    fn test_format_centiseconds() {
        assert_eq!(format_centiseconds(0), "0.00");
        assert_eq!(format_centiseconds(305), "3.05");
        assert_eq!(format_centiseconds(6_112), "1:01.12");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("problem", 1), "1 problem");
        assert_eq!(pluralize("problem", 0), "0 problems");
        assert_eq!(pluralize("digit", 3), "3 digits");
    }
}
