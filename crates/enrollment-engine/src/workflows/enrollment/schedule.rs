use std::collections::HashSet;

use chrono::Weekday;

/// Weekdays named in a free-text schedule descriptor. Times and other tokens are ignored.
pub fn day_tokens(descriptor: &str) -> HashSet<Weekday> {
    descriptor
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '/' | '-' | ';'))
        .filter_map(weekday_from_token)
        .collect()
}

fn weekday_from_token(token: &str) -> Option<Weekday> {
    match token.to_ascii_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
        "wed" | "weds" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thur" | "thurs" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Day-level overlap only; two sections on the same day conflict regardless of time.
pub fn shares_meeting_day(left: &str, right: &str) -> bool {
    let left = day_tokens(left);
    if left.is_empty() {
        return false;
    }
    day_tokens(right).iter().any(|day| left.contains(day))
}
