use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use time::Time;

static TIME_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new("^(?:\\d{4}-\\d{2}-\\d{2}[T ])?(\\d{1,2}):(\\d{2})(?::(\\d{2}))?").unwrap());

/// One scheduled class occurrence, independent of the feed it came from.
///
/// `weekday` always uses the canonical one-based coding (Monday is `1`),
/// times are kept as the raw text of the feed and validated by the
/// normalizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEntry {
  pub subject_name: String,
  pub lesson_type: String,
  pub weekday: i64,
  pub slot: u32,
  pub week_parity: i64,
  pub week_recurrence: Option<i64>,
  pub room: String,
  pub teacher_full: String,
  pub teacher_short: String,
  pub time_start: String,
  pub time_end: String,
}

/// Parses `H:MM`, `HH:MM`, `HH:MM:SS` or an ISO datetime such as
/// `0001-01-01T09:00:00`, keeping only the time of day.
pub fn parse_time_of_day(value: &str) -> Option<Time> {
  let captures = TIME_REGEX.captures(value.trim())?;

  let hour = u8::from_str(captures.get(1)?.as_str()).ok()?;
  let minute = u8::from_str(captures.get(2)?.as_str()).ok()?;
  let second = match captures.get(3) {
    None => 0,
    Some(second) => u8::from_str(second.as_str()).ok()?,
  };

  Time::from_hms(hour, minute, second).ok()
}

/// `HH:MM`
pub fn format_time_of_day(time: Time) -> String {
  format!("{:0>2}:{:0>2}", time.hour(), time.minute())
}
