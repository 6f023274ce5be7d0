use serde::Serialize;
use time::PrimitiveDateTime;

pub use crate::day::{DayCoding, StudyDay};
pub use crate::entry::{format_time_of_day, parse_time_of_day, RawEntry};
pub use crate::feed::{Feed, FlatItem, NestedItem, NestedResponse, SlotTimetable};
pub use crate::normalize::{
  normalize, place, type_tag, DaySchedule, GroupedSchedule, LessonView, PlacedLesson, SkipReason,
  WeekParity, WeekSchedule,
};
pub use crate::progress::{progress, progress_between};
pub use crate::week::{
  compute_week_state, parse_semester_start, valid_weekdays, BaselineError, WeekState,
};

mod day;
mod entry;
pub mod feed;
mod normalize;
mod progress;
mod week;

/// A normalized schedule as handed to consumers after a refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduleSnapshot {
  pub last_updated: String,
  pub semester: String,
  pub week_type: GroupedSchedule,
}

impl ScheduleSnapshot {
  pub fn new(feed: Feed, refreshed_at: PrimitiveDateTime) -> Self {
    let semester = feed.semester().unwrap_or_default().to_string();

    Self {
      last_updated: format!(
        "{:0>4}-{:0>2}-{:0>2}T{:0>2}:{:0>2}",
        refreshed_at.year(),
        refreshed_at.month() as u8,
        refreshed_at.day(),
        refreshed_at.hour(),
        refreshed_at.minute()
      ),
      semester,
      week_type: normalize(feed.into_entries()),
    }
  }

  /// Days of the current week that are still to come, in display order.
  pub fn visible_days<'a>(
    &'a self,
    state: &'a WeekState,
  ) -> impl Iterator<Item = (StudyDay, &'a DaySchedule)> + 'a {
    let week = self.week_type.week(state.current_week_parity);

    state
      .valid_weekdays
      .iter()
      .filter_map(move |day| week.get(day).map(|lessons| (*day, lessons)))
  }
}
