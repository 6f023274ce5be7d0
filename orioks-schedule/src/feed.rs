//! Upstream feed shapes and their adapters to [`RawEntry`].
//!
//! Two shapes are in circulation: the flat ORIOKS group schedule (zero-based
//! days, no clock times) and the nested MIET schedule (one-based days, clock
//! times per lesson). Both are resolved to [`RawEntry`] here so the
//! normalizer never sees the difference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::day::{DayCoding, StudyDay};
use crate::entry::RawEntry;

/// Item of `GET /api/v1/schedule/groups/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatItem {
  pub name: String,
  #[serde(rename = "type")]
  pub lesson_type: String,
  pub day: i64,
  #[serde(rename = "class")]
  pub slot: u32,
  pub week: i64,
  #[serde(default)]
  pub week_recurrence: Option<i64>,
  #[serde(default)]
  pub location: String,
  #[serde(default)]
  pub teacher: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NestedTime {
  #[serde(rename = "Time", default)]
  pub label: String,
  pub code: u32,
  pub time_from: String,
  pub time_to: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NestedClass {
  pub name: String,
  #[serde(default)]
  pub teacher_full: String,
  #[serde(default)]
  pub teacher: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NestedNamed {
  #[serde(default)]
  pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NestedItem {
  pub day: i64,
  pub day_number: i64,
  pub time: NestedTime,
  pub class: NestedClass,
  #[serde(default)]
  pub group: Option<NestedNamed>,
  #[serde(default)]
  pub room: Option<NestedNamed>,
}

/// Whole response of the MIET schedule endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NestedResponse {
  #[serde(default)]
  pub times: Vec<NestedTime>,
  pub data: Vec<NestedItem>,
  #[serde(rename = "Semestr", default)]
  pub semester: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotTimes {
  pub start: String,
  pub end: String,
}

/// Bell schedule, slot code to start and end of the lesson.
///
/// Deserializes from the ORIOKS timetable shape `{"1": ["09:00", "10:20"]}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>")]
pub struct SlotTimetable {
  slots: BTreeMap<u32, SlotTimes>,
}

impl SlotTimetable {
  pub fn get(&self, slot: u32) -> Option<&SlotTimes> {
    self.slots.get(&slot)
  }

  pub fn insert(&mut self, slot: u32, start: impl Into<String>, end: impl Into<String>) {
    self.slots.insert(
      slot,
      SlotTimes {
        start: start.into(),
        end: end.into(),
      },
    );
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }
}

impl Default for SlotTimetable {
  /// The MIET bell schedule.
  fn default() -> Self {
    let mut timetable = Self {
      slots: BTreeMap::new(),
    };

    for (slot, start, end) in [
      (1, "09:00", "10:20"),
      (2, "10:30", "11:50"),
      (3, "12:00", "13:20"),
      (4, "13:30", "14:50"),
      (5, "15:00", "16:20"),
      (6, "16:30", "17:50"),
      (7, "18:00", "19:20"),
    ] {
      timetable.insert(slot, start, end);
    }

    timetable
  }
}

impl From<BTreeMap<String, Vec<String>>> for SlotTimetable {
  fn from(raw: BTreeMap<String, Vec<String>>) -> Self {
    let mut timetable = Self {
      slots: BTreeMap::new(),
    };

    for (key, times) in raw {
      match (key.trim().parse::<u32>(), times.as_slice()) {
        (Ok(slot), [start, end, ..]) => timetable.insert(slot, start.as_str(), end.as_str()),
        _ => warn!("Ignoring malformed timetable slot {key:?}: {times:?}"),
      }
    }

    timetable
  }
}

impl FlatItem {
  /// Zero-based day becomes the canonical one-based day, clock times come
  /// from `timetable`. A slot unknown to the timetable yields empty times.
  pub fn into_entry(self, timetable: &SlotTimetable) -> RawEntry {
    let weekday = match StudyDay::from_code(self.day, DayCoding::ZeroBased) {
      Some(day) => i64::from(day.number()),
      // keeps the value out of range for the normalizer to report
      None => self.day.checked_add(1).unwrap_or(i64::MIN),
    };

    let (time_start, time_end) = match timetable.get(self.slot) {
      Some(times) => (times.start.clone(), times.end.clone()),
      None => (String::new(), String::new()),
    };

    RawEntry {
      subject_name: self.name,
      lesson_type: self.lesson_type,
      weekday,
      slot: self.slot,
      week_parity: self.week,
      week_recurrence: self.week_recurrence,
      room: self.location,
      teacher_short: initials(&self.teacher),
      teacher_full: self.teacher,
      time_start,
      time_end,
    }
  }
}

impl From<NestedItem> for RawEntry {
  fn from(item: NestedItem) -> Self {
    let teacher_short = if item.class.teacher.is_empty() {
      initials(&item.class.teacher_full)
    } else {
      item.class.teacher
    };

    RawEntry {
      subject_name: item.class.name,
      lesson_type: String::new(),
      weekday: item.day,
      slot: item.time.code,
      week_parity: item.day_number,
      week_recurrence: None,
      room: item.room.map(|room| room.name).unwrap_or_default(),
      teacher_full: item.class.teacher_full,
      teacher_short,
      time_start: item.time.time_from,
      time_end: item.time.time_to,
    }
  }
}

/// The two upstream shapes, resolved at the ingestion boundary.
#[derive(Clone, Debug)]
pub enum Feed {
  Flat {
    items: Vec<FlatItem>,
    timetable: SlotTimetable,
  },
  Nested(NestedResponse),
}

impl Feed {
  pub fn semester(&self) -> Option<&str> {
    match self {
      Feed::Flat { .. } => None,
      Feed::Nested(response) if response.semester.is_empty() => None,
      Feed::Nested(response) => Some(response.semester.as_str()),
    }
  }

  pub fn into_entries(self) -> Vec<RawEntry> {
    match self {
      Feed::Flat { items, timetable } => items
        .into_iter()
        .map(|item| item.into_entry(&timetable))
        .collect(),
      Feed::Nested(response) => response.data.into_iter().map(RawEntry::from).collect(),
    }
  }
}

/// `Иванов Иван Иванович` becomes `Иванов И.И.`; names that already look
/// abbreviated or consist of a single word are returned unchanged.
pub fn initials(full_name: &str) -> String {
  let mut parts = full_name.split_whitespace();

  let surname = match parts.next() {
    None => return String::new(),
    Some(surname) => surname,
  };

  if full_name.contains('.') {
    return full_name.trim().to_string();
  }

  let mut short = surname.to_string();
  let mut first = true;

  for part in parts {
    if let Some(letter) = part.chars().next() {
      if first {
        short.push(' ');
        first = false;
      }
      short.push(letter);
      short.push('.');
    }
  }

  short
}
