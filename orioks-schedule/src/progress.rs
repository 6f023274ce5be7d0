use time::{PrimitiveDateTime, Time};

use crate::day::StudyDay;
use crate::entry::parse_time_of_day;
use crate::normalize::LessonView;

/// How far a lesson has progressed at `now`, between `0.0` and `1.0`.
///
/// Lessons that are not held today, and lessons whose times do not parse,
/// always report `0.0`.
pub fn progress(time_start: &str, time_end: &str, is_today: bool, now: PrimitiveDateTime) -> f64 {
  if !is_today {
    return 0.0;
  }

  match (parse_time_of_day(time_start), parse_time_of_day(time_end)) {
    (Some(start), Some(end)) => progress_between(start, end, now),
    _ => 0.0,
  }
}

/// Progress between two already parsed times of day on the date of `now`.
pub fn progress_between(start: Time, end: Time, now: PrimitiveDateTime) -> f64 {
  let start = PrimitiveDateTime::new(now.date(), start);
  let end = PrimitiveDateTime::new(now.date(), end);

  if now <= start {
    return 0.0;
  }
  if now >= end {
    return 1.0;
  }

  let total = (end - start).as_seconds_f64();
  let elapsed = (now - start).as_seconds_f64();

  (elapsed / total).clamp(0.0, 1.0)
}

impl LessonView {
  /// Progress of this lesson when it is held on `day`, from the times the
  /// normalizer already validated.
  pub fn progress(&self, day: StudyDay, now: PrimitiveDateTime) -> f64 {
    if StudyDay::from_weekday(now.weekday()) != Some(day) {
      return 0.0;
    }

    progress_between(self.start, self.end, now)
  }
}

#[cfg(test)]
mod test {
  use time::macros::{datetime, time};

  use super::{progress, progress_between};

  #[test]
  fn halfway() {
    let value = progress("09:00", "10:20", true, datetime!(2025-02-10 09:40));
    assert!((value - 0.5).abs() < 1e-9);
  }

  #[test]
  fn not_today() {
    for now in [
      datetime!(2025-02-10 08:00),
      datetime!(2025-02-10 09:40),
      datetime!(2025-02-10 23:00),
    ] {
      assert_eq!(progress("09:00", "10:20", false, now), 0.0);
    }
  }

  #[test]
  fn bounds() {
    assert_eq!(progress("09:00", "10:20", true, datetime!(2025-02-10 08:59)), 0.0);
    assert_eq!(progress("09:00", "10:20", true, datetime!(2025-02-10 09:00)), 0.0);
    assert_eq!(progress("09:00", "10:20", true, datetime!(2025-02-10 10:20)), 1.0);
    assert_eq!(progress("09:00", "10:20", true, datetime!(2025-02-10 18:00)), 1.0);
  }

  #[test]
  fn malformed() {
    assert_eq!(progress("9 o'clock", "10:20", true, datetime!(2025-02-10 09:40)), 0.0);
    assert_eq!(progress("09:00", "", true, datetime!(2025-02-10 09:40)), 0.0);
  }

  #[test]
  fn parsed_times() {
    let value = progress_between(time!(13:30), time!(14:50), datetime!(2025-02-10 14:10));
    assert!((value - 0.5).abs() < 1e-9);
    assert_eq!(progress_between(time!(13:30), time!(14:50), datetime!(2025-02-10 15:00)), 1.0);
  }

  #[test]
  fn degenerate_range() {
    assert_eq!(progress("10:00", "10:00", true, datetime!(2025-02-10 09:59)), 0.0);
    assert_eq!(progress("10:00", "09:00", true, datetime!(2025-02-10 11:00)), 1.0);
  }
}
