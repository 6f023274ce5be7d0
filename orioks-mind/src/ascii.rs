use std::fmt::Write;

use time::PrimitiveDateTime;

use orioks_client::Student;
use orioks_schedule::{ScheduleSnapshot, WeekState};

const BAR_WIDTH: usize = 10;

pub fn progress_bar(progress: f64) -> String {
  let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
  format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Renders the days of the current week that are still to come.
pub fn table(
  group: &str,
  snapshot: &ScheduleSnapshot,
  state: &WeekState,
  now: PrimitiveDateTime,
) -> String {
  let mut buf = String::new();

  writeln!(
    buf,
    "{} · неделя {} · тип недели {}",
    group, state.week_number, state.current_week_parity
  )
  .unwrap();

  let mut empty = true;

  for (day, lessons) in snapshot.visible_days(state) {
    empty = false;
    writeln!(buf, "\n{}", day.russian_name().to_uppercase()).unwrap();

    for (slot, lesson) in lessons {
      writeln!(
        buf,
        "{:>2}  {}–{}  {}  {:<40} {:<8} {}",
        slot,
        lesson.time_start,
        lesson.time_end,
        progress_bar(lesson.progress(day, now)),
        lesson.name,
        lesson.classroom,
        lesson.teacher
      )
      .unwrap();
    }
  }

  if empty {
    writeln!(buf, "\nНа этой неделе занятий больше нет").unwrap();
  }

  buf
}

/// Profile of the logged in student, together with the token needed to skip
/// the login next time.
pub fn student(student: &Student, token: &str) -> String {
  let mut buf = String::new();

  writeln!(buf, "{}", student.full_name).unwrap();
  for (label, value) in [
    ("Группа", student.group.clone()),
    ("Курс", student.course.to_string()),
    ("Семестр", student.semester.to_string()),
    ("Кафедра", student.department.clone()),
    ("Направление", student.study_direction.clone()),
    ("Профиль", student.study_profile.clone()),
    ("Учебный год", student.year.clone()),
    ("Зачётная книжка", student.record_book_id.to_string()),
    ("Токен", token.to_string()),
  ] {
    writeln!(buf, "{:<16} {}", label, value).unwrap();
  }

  buf
}

#[cfg(test)]
mod test {
  use time::macros::datetime;

  use orioks_client::Student;
  use orioks_schedule::{compute_week_state, Feed, NestedResponse, ScheduleSnapshot};

  use crate::ascii::{progress_bar, student, table};

  #[test]
  fn bar() {
    assert_eq!(progress_bar(0.0), "░░░░░░░░░░");
    assert_eq!(progress_bar(0.5), "█████░░░░░");
    assert_eq!(progress_bar(1.0), "██████████");
    assert_eq!(progress_bar(7.0), "██████████");
  }

  #[test]
  fn renders_remaining_days() {
    let response: NestedResponse = serde_json::from_value(serde_json::json!({
      "Data": [
        {
          "Day": 1,
          "DayNumber": 0,
          "Time": { "Time": "1 пара", "Code": 1, "TimeFrom": "0001-01-01T09:00:00", "TimeTo": "0001-01-01T10:20:00" },
          "Class": { "Name": "Физика [Лек]", "TeacherFull": "Сидоров Петр Ильич", "Teacher": "Сидоров П.И." },
          "Room": { "Name": "3103" }
        },
        {
          "Day": 2,
          "DayNumber": 0,
          "Time": { "Time": "2 пара", "Code": 2, "TimeFrom": "0001-01-01T10:30:00", "TimeTo": "0001-01-01T11:50:00" },
          "Class": { "Name": "История", "TeacherFull": "Смирнова Ольга Викторовна", "Teacher": "Смирнова О.В." },
          "Room": { "Name": "1201" }
        }
      ],
      "Semestr": "Весенний семестр"
    }))
    .unwrap();

    let now = datetime!(2025-02-11 11:10);
    let snapshot = ScheduleSnapshot::new(Feed::Nested(response), now);
    let state = compute_week_state("2025-02-10", now.date()).unwrap();

    let text = table("ПИН-21", &snapshot, &state, now);
    assert!(text.starts_with("ПИН-21 · неделя 1 · тип недели 0"));
    assert!(!text.contains("ПОНЕДЕЛЬНИК"));
    assert!(text.contains("ВТОРНИК"));
    assert!(text.contains("10:30–11:50  █████░░░░░  История"));

    let state = compute_week_state("2025-02-10", datetime!(2025-02-15 08:00).date()).unwrap();
    let text = table("ПИН-21", &snapshot, &state, now);
    assert!(text.contains("На этой неделе занятий больше нет"));
  }

  #[test]
  fn renders_student() {
    let profile = Student {
      course: 3,
      department: "ИПОВС".to_string(),
      full_name: "Иванов Иван Иванович".to_string(),
      group: "ПИН-21".to_string(),
      record_book_id: 8123456,
      semester: 6,
      study_direction: "09.03.04".to_string(),
      study_profile: "Программная инженерия".to_string(),
      year: "2024/2025".to_string(),
    };

    let text = student(&profile, "secret-token");
    assert!(text.starts_with("Иванов Иван Иванович\n"));
    assert!(text.contains("ПИН-21"));
    assert!(text.contains("8123456"));
    assert!(text.lines().last().unwrap().ends_with("secret-token"));
  }
}
