use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;
use time::Time;
use tracing::{debug, warn};

use crate::day::{DayCoding, StudyDay};
use crate::entry::{format_time_of_day, parse_time_of_day, RawEntry};

static TYPE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("\\[([^\\[\\]]*)\\]\\s*$").unwrap());

/// One of the four recurring week patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WeekParity(u8);

impl WeekParity {
  pub const ALL: [WeekParity; 4] = [WeekParity(0), WeekParity(1), WeekParity(2), WeekParity(3)];

  pub fn new(value: i64) -> Option<Self> {
    match value {
      0..=3 => Some(Self(value as u8)),
      _ => None,
    }
  }

  pub fn value(self) -> u8 {
    self.0
  }

  fn index(self) -> usize {
    self.0 as usize
  }
}

impl Display for WeekParity {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Render-ready projection of a [`RawEntry`].
///
/// Field names on the wire follow the transformed schedule the consumers
/// already understand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LessonView {
  pub name: String,
  pub classroom: String,
  #[serde(rename = "TeacherFull")]
  pub teacher_full: String,
  #[serde(rename = "Teacher")]
  pub teacher: String,
  #[serde(rename = "type")]
  pub lesson_type: String,
  pub time_start: String,
  pub time_end: String,
  #[serde(skip)]
  pub start: Time,
  #[serde(skip)]
  pub end: Time,
}

pub type DaySchedule = BTreeMap<u32, LessonView>;
pub type WeekSchedule = BTreeMap<StudyDay, DaySchedule>;

/// Lessons keyed by week parity, study day and slot code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupedSchedule {
  weeks: [WeekSchedule; 4],
}

/// A lesson together with the position it occupies in the grouped schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedLesson {
  pub parity: WeekParity,
  pub day: StudyDay,
  pub slot: u32,
  pub view: LessonView,
}

/// Why a single entry did not make it into the grouped schedule.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SkipReason {
  #[error("weekday {0} is outside of 1..=6")]
  Weekday(i64),
  #[error("week parity {0} is outside of 0..=3")]
  WeekParity(i64),
  #[error("unparseable time of day {0:?}")]
  Time(String),
  #[error("lesson starts at {start} but ends at {end}")]
  EmptyRange { start: String, end: String },
}

impl GroupedSchedule {
  pub fn week(&self, parity: WeekParity) -> &WeekSchedule {
    &self.weeks[parity.index()]
  }

  pub fn day(&self, parity: WeekParity, day: StudyDay) -> Option<&DaySchedule> {
    self.week(parity).get(&day)
  }

  pub fn lesson(&self, parity: WeekParity, day: StudyDay, slot: u32) -> Option<&LessonView> {
    self.day(parity, day).and_then(|lessons| lessons.get(&slot))
  }

  pub fn iter(&self) -> impl Iterator<Item = (WeekParity, StudyDay, u32, &LessonView)> + '_ {
    WeekParity::ALL.into_iter().flat_map(move |parity| {
      self.week(parity).iter().flat_map(move |(day, lessons)| {
        lessons
          .iter()
          .map(move |(slot, lesson)| (parity, *day, *slot, lesson))
      })
    })
  }

  /// Total count of lessons over all buckets.
  pub fn len(&self) -> usize {
    self
      .weeks
      .iter()
      .flat_map(|week| week.values())
      .map(|lessons| lessons.len())
      .sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the lesson previously stored at the same position.
  fn insert(&mut self, lesson: PlacedLesson) -> Option<LessonView> {
    self.weeks[lesson.parity.index()]
      .entry(lesson.day)
      .or_default()
      .insert(lesson.slot, lesson.view)
  }
}

impl Serialize for GroupedSchedule {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.weeks.len()))?;
    for parity in WeekParity::ALL {
      map.serialize_entry(&parity.to_string(), self.week(parity))?;
    }
    map.end()
  }
}

/// Bracketed annotation at the end of a subject name, `Физика [Лаб]` yields
/// `Лаб`.
pub fn type_tag(subject_name: &str) -> Option<&str> {
  TYPE_REGEX
    .captures(subject_name)
    .and_then(|captures| captures.get(1))
    .map(|tag| tag.as_str().trim())
}

/// Validates a single entry and computes its position and view.
pub fn place(entry: &RawEntry) -> Result<PlacedLesson, SkipReason> {
  let day = StudyDay::from_code(entry.weekday, DayCoding::OneBased)
    .ok_or(SkipReason::Weekday(entry.weekday))?;
  let parity = WeekParity::new(entry.week_parity).ok_or(SkipReason::WeekParity(entry.week_parity))?;

  let start =
    parse_time_of_day(&entry.time_start).ok_or_else(|| SkipReason::Time(entry.time_start.clone()))?;
  let end =
    parse_time_of_day(&entry.time_end).ok_or_else(|| SkipReason::Time(entry.time_end.clone()))?;

  if start >= end {
    return Err(SkipReason::EmptyRange {
      start: format_time_of_day(start),
      end: format_time_of_day(end),
    });
  }

  let lesson_type = match type_tag(&entry.subject_name) {
    Some(tag) => tag.to_string(),
    None => entry.lesson_type.trim().to_string(),
  };

  Ok(PlacedLesson {
    parity,
    day,
    slot: entry.slot,
    view: LessonView {
      name: entry.subject_name.clone(),
      classroom: entry.room.clone(),
      teacher_full: entry.teacher_full.clone(),
      teacher: entry.teacher_short.clone(),
      lesson_type,
      time_start: format_time_of_day(start),
      time_end: format_time_of_day(end),
      start,
      end,
    },
  })
}

/// Groups entries by week parity, study day and slot.
///
/// Malformed entries are logged and left out. When two entries share a
/// position the later one wins.
pub fn normalize<I>(entries: I) -> GroupedSchedule
where
  I: IntoIterator<Item = RawEntry>,
{
  let mut schedule = GroupedSchedule::default();

  for entry in entries {
    let lesson = match place(&entry) {
      Err(reason) => {
        warn!(
          "Skipping lesson {:?} in slot {}: {}",
          entry.subject_name, entry.slot, reason
        );
        continue;
      }
      Ok(lesson) => lesson,
    };

    let (parity, day, slot) = (lesson.parity, lesson.day, lesson.slot);

    if let Some(previous) = schedule.insert(lesson) {
      debug!(
        "Lesson {:?} at week {}, {}, slot {} replaced by a later entry",
        previous.name, parity, day, slot
      );
    }
  }

  schedule
}
