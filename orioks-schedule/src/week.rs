use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use time::{Date, Month};

use crate::day::StudyDay;
use crate::normalize::WeekParity;

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("^(\\d{4})-(\\d{2})-(\\d{2})$").unwrap());

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BaselineError {
  #[error("semester start {0:?} is not a yyyy-MM-dd date")]
  Format(String),
  #[error("semester start {0:?} is not a calendar date")]
  Calendar(String),
}

/// Position of a day within the semester, recomputed on every refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekState {
  pub week_number: i64,
  pub current_week_parity: WeekParity,
  pub valid_weekdays: Vec<StudyDay>,
}

impl WeekState {
  /// What to show when the semester start is unknown.
  pub fn fallback() -> Self {
    Self {
      week_number: 1,
      current_week_parity: WeekParity::ALL[0],
      valid_weekdays: StudyDay::ALL.to_vec(),
    }
  }

  pub fn from_baseline(semester_start: Date, now: Date) -> Self {
    let elapsed_days = (now - semester_start).whole_days();
    let week_number = (elapsed_days + 1).div_euclid(7) + 1;
    let parity = (week_number - 1).rem_euclid(4);

    Self {
      week_number,
      current_week_parity: WeekParity::ALL[parity as usize],
      valid_weekdays: valid_weekdays(now),
    }
  }

  pub fn is_valid(&self, day: StudyDay) -> bool {
    self.valid_weekdays.contains(&day)
  }
}

/// Parses `yyyy-MM-dd`, surrounding whitespace is ignored.
pub fn parse_semester_start(value: &str) -> Result<Date, BaselineError> {
  let value = value.trim();
  let format_error = || BaselineError::Format(value.to_string());
  let calendar_error = |_| BaselineError::Calendar(value.to_string());

  let captures = DATE_REGEX.captures(value).ok_or_else(format_error)?;
  let year = i32::from_str(&captures[1]).map_err(|_| format_error())?;
  let month = u8::from_str(&captures[2]).map_err(|_| format_error())?;
  let day = u8::from_str(&captures[3]).map_err(|_| format_error())?;

  let month = Month::try_from(month).map_err(calendar_error)?;
  Date::from_calendar_date(year, month, day).map_err(calendar_error)
}

pub fn compute_week_state(semester_start: &str, now: Date) -> Result<WeekState, BaselineError> {
  let semester_start = parse_semester_start(semester_start)?;
  Ok(WeekState::from_baseline(semester_start, now))
}

/// Study days whose next occurrence (today included) is still inside the
/// current Sunday-first calendar week.
pub fn valid_weekdays(now: Date) -> Vec<StudyDay> {
  let today = i16::from(now.weekday().number_days_from_sunday());
  let days_left = 7 - today;

  StudyDay::ALL
    .into_iter()
    .filter(|day| {
      let ahead = (i16::from(day.weekday().number_days_from_sunday()) - today).rem_euclid(7);
      ahead < days_left
    })
    .collect()
}
