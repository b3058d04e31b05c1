//! Human-relative rendering of instants ("in 3 months", "2 days ago").

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
/// Mean Gregorian month (146097 days per 4800 months).
const MONTH: f64 = DAY * 146_097.0 / 4_800.0;
const YEAR: f64 = 12.0 * MONTH;

/// Render `timestamp` relative to `now`, both Unix seconds.
///
/// Each unit is rounded independently and the first matching bucket wins:
/// up to 44 s is "a few seconds", then minutes below 45, hours below 22,
/// days below 26, months below 11, then years.
pub fn relative_time(timestamp: i64, now: i64) -> String {
    let delta = timestamp.saturating_sub(now);
    let phrase = magnitude((delta as f64).abs());
    if delta > 0 {
        format!("in {}", phrase)
    } else {
        format!("{} ago", phrase)
    }
}

fn magnitude(secs: f64) -> String {
    let seconds = secs.round();
    let minutes = (secs / MINUTE).round();
    let hours = (secs / HOUR).round();
    let days = (secs / DAY).round();
    let months = (secs / MONTH).round();
    let years = (secs / YEAR).round();

    if seconds <= 44.0 {
        "a few seconds".into()
    } else if minutes <= 1.0 {
        "a minute".into()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes)
    } else if hours <= 1.0 {
        "an hour".into()
    } else if hours < 22.0 {
        format!("{} hours", hours)
    } else if days <= 1.0 {
        "a day".into()
    } else if days < 26.0 {
        format!("{} days", days)
    } else if months <= 1.0 {
        "a month".into()
    } else if months < 11.0 {
        format!("{} months", months)
    } else if years <= 1.0 {
        "a year".into()
    } else {
        format!("{} years", years)
    }
}
