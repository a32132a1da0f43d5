//! Relative-time text for notification and chat-history lists.
//!
//! Inputs are elapsed whole seconds so callers decide the clock source.

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;
const WEEK: i64 = 604_800;
const MONTH: i64 = 2_592_000;
const YEAR: i64 = 31_536_000;

/// Compact form used by the notification dropdown.
///
/// Returns `None` once the age reaches a week; callers then show a date.
pub fn time_ago_compact(elapsed_s: i64) -> Option<String> {
    let s = elapsed_s.max(0);
    if s < MINUTE {
        Some("Just now".to_string())
    } else if s < HOUR {
        Some(format!("{}m ago", s / MINUTE))
    } else if s < DAY {
        Some(format!("{}h ago", s / HOUR))
    } else if s < WEEK {
        Some(format!("{}d ago", s / DAY))
    } else {
        None
    }
}

/// Long form used by the chat-history sidebar ("1 hour ago", "3 weeks ago").
pub fn time_ago_long(elapsed_s: i64) -> String {
    let s = elapsed_s.max(0);
    let units = [
        ("year", YEAR),
        ("month", MONTH),
        ("week", WEEK),
        ("day", DAY),
        ("hour", HOUR),
        ("minute", MINUTE),
    ];
    for (unit, secs) in units {
        let n = s / secs;
        if n == 1 {
            return format!("1 {unit} ago");
        }
        if n > 1 {
            return format!("{n} {unit}s ago");
        }
    }
    "Just now".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_thresholds() {
        assert_eq!(time_ago_compact(5).as_deref(), Some("Just now"));
        assert_eq!(time_ago_compact(125).as_deref(), Some("2m ago"));
        assert_eq!(time_ago_compact(2 * HOUR).as_deref(), Some("2h ago"));
        assert_eq!(time_ago_compact(3 * DAY).as_deref(), Some("3d ago"));
        assert_eq!(time_ago_compact(WEEK), None);
    }

    #[test]
    fn compact_clamps_future_timestamps() {
        assert_eq!(time_ago_compact(-30).as_deref(), Some("Just now"));
    }

    #[test]
    fn long_form_pluralizes() {
        assert_eq!(time_ago_long(30), "Just now");
        assert_eq!(time_ago_long(60), "1 minute ago");
        assert_eq!(time_ago_long(3 * HOUR + 5), "3 hours ago");
        assert_eq!(time_ago_long(8 * DAY), "1 week ago");
        assert_eq!(time_ago_long(400 * DAY), "1 year ago");
    }
}
