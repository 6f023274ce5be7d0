use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Weekday;

/// A day of the six-day study week.
///
/// Serialized with its Russian display name, which is also the key used in
/// the grouped schedule handed to consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StudyDay {
  #[serde(rename = "Понедельник")]
  Monday,
  #[serde(rename = "Вторник")]
  Tuesday,
  #[serde(rename = "Среда")]
  Wednesday,
  #[serde(rename = "Четверг")]
  Thursday,
  #[serde(rename = "Пятница")]
  Friday,
  #[serde(rename = "Суббота")]
  Saturday,
}

/// How a feed numbers its days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayCoding {
  /// `0` is Monday, `5` is Saturday (flat ORIOKS feed).
  ZeroBased,
  /// `1` is Monday, `6` is Saturday (nested MIET feed, canonical).
  OneBased,
}

impl StudyDay {
  pub const ALL: [StudyDay; 6] = [
    StudyDay::Monday,
    StudyDay::Tuesday,
    StudyDay::Wednesday,
    StudyDay::Thursday,
    StudyDay::Friday,
    StudyDay::Saturday,
  ];

  pub fn from_code(code: i64, coding: DayCoding) -> Option<Self> {
    let index = match coding {
      DayCoding::ZeroBased => code,
      DayCoding::OneBased => code.checked_sub(1)?,
    };

    usize::try_from(index)
      .ok()
      .and_then(|index| Self::ALL.get(index).copied())
  }

  /// Canonical one-based number, Monday is `1`.
  pub fn number(self) -> u8 {
    self as u8 + 1
  }

  pub fn russian_name(self) -> &'static str {
    match self {
      StudyDay::Monday => "Понедельник",
      StudyDay::Tuesday => "Вторник",
      StudyDay::Wednesday => "Среда",
      StudyDay::Thursday => "Четверг",
      StudyDay::Friday => "Пятница",
      StudyDay::Saturday => "Суббота",
    }
  }

  pub fn english_code(self) -> &'static str {
    match self {
      StudyDay::Monday => "monday",
      StudyDay::Tuesday => "tuesday",
      StudyDay::Wednesday => "wednesday",
      StudyDay::Thursday => "thursday",
      StudyDay::Friday => "friday",
      StudyDay::Saturday => "saturday",
    }
  }

  /// Sunday is not a study day.
  pub fn from_weekday(weekday: Weekday) -> Option<Self> {
    match weekday {
      Weekday::Monday => Some(StudyDay::Monday),
      Weekday::Tuesday => Some(StudyDay::Tuesday),
      Weekday::Wednesday => Some(StudyDay::Wednesday),
      Weekday::Thursday => Some(StudyDay::Thursday),
      Weekday::Friday => Some(StudyDay::Friday),
      Weekday::Saturday => Some(StudyDay::Saturday),
      Weekday::Sunday => None,
    }
  }

  pub fn weekday(self) -> Weekday {
    match self {
      StudyDay::Monday => Weekday::Monday,
      StudyDay::Tuesday => Weekday::Tuesday,
      StudyDay::Wednesday => Weekday::Wednesday,
      StudyDay::Thursday => Weekday::Thursday,
      StudyDay::Friday => Weekday::Friday,
      StudyDay::Saturday => Weekday::Saturday,
    }
  }
}

impl Display for StudyDay {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.russian_name())
  }
}

impl FromStr for StudyDay {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    let value = value.trim();

    Self::ALL
      .into_iter()
      .find(|day| {
        day.russian_name().to_lowercase() == value.to_lowercase()
          || day.english_code().eq_ignore_ascii_case(value)
      })
      .ok_or_else(|| format!("unknown study day {value:?}"))
  }
}

#[cfg(test)]
mod test {
  use time::Weekday;

  use super::{DayCoding, StudyDay};

  #[test]
  fn both_codings_agree() {
    for (index, day) in StudyDay::ALL.into_iter().enumerate() {
      let index = index as i64;
      assert_eq!(StudyDay::from_code(index, DayCoding::ZeroBased), Some(day));
      assert_eq!(StudyDay::from_code(index + 1, DayCoding::OneBased), Some(day));
    }
  }

  #[test]
  fn out_of_range_codes() {
    assert_eq!(StudyDay::from_code(6, DayCoding::ZeroBased), None);
    assert_eq!(StudyDay::from_code(0, DayCoding::OneBased), None);
    assert_eq!(StudyDay::from_code(7, DayCoding::OneBased), None);
    assert_eq!(StudyDay::from_code(-1, DayCoding::ZeroBased), None);
    assert_eq!(StudyDay::from_code(9, DayCoding::OneBased), None);
    assert_eq!(StudyDay::from_code(i64::MIN, DayCoding::OneBased), None);
    assert_eq!(StudyDay::from_code(i64::MAX, DayCoding::ZeroBased), None);
  }

  #[test]
  fn names() {
    assert_eq!(StudyDay::Monday.russian_name(), "Понедельник");
    assert_eq!(StudyDay::Saturday.russian_name(), "Суббота");
    assert_eq!(StudyDay::Wednesday.english_code(), "wednesday");
    assert_eq!(StudyDay::Friday.number(), 5);
    assert_eq!("Среда".parse::<StudyDay>(), Ok(StudyDay::Wednesday));
    assert_eq!("ЧЕТВЕРГ".parse::<StudyDay>(), Ok(StudyDay::Thursday));
    assert_eq!("Tuesday".parse::<StudyDay>(), Ok(StudyDay::Tuesday));
    assert!("sunday".parse::<StudyDay>().is_err());
  }

  #[test]
  fn sunday_is_no_study_day() {
    assert_eq!(StudyDay::from_weekday(Weekday::Sunday), None);
    assert_eq!(
      StudyDay::from_weekday(Weekday::Thursday),
      Some(StudyDay::Thursday)
    );
    assert_eq!(StudyDay::Saturday.weekday(), Weekday::Saturday);
  }
}
