use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use orioks_schedule::{LessonView, ScheduleSnapshot, StudyDay, WeekState};

use crate::mind::{Clock, Mind};

#[derive(Clone)]
pub struct AppState {
  pub mind: Arc<Mind>,
  pub clock: Clock,
}

type Unavailable = (StatusCode, &'static str);

const NOT_LOADED: Unavailable = (StatusCode::SERVICE_UNAVAILABLE, "schedule not loaded yet");

#[derive(Serialize)]
struct Health {
  status: &'static str,
  last_checked: Option<String>,
}

#[derive(Serialize)]
struct TodayLesson {
  slot: u32,
  #[serde(flatten)]
  lesson: LessonView,
  progress: f64,
}

#[derive(Serialize)]
struct Today {
  day: Option<StudyDay>,
  lessons: Vec<TodayLesson>,
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/schedule", get(schedule))
    .route("/week", get(week))
    .route("/today", get(today))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Health> {
  let data = state.mind.data().await;

  Json(Health {
    status: "ok",
    last_checked: data.as_ref().map(|data| data.last_checked.to_string()),
  })
}

async fn schedule(State(state): State<AppState>) -> Result<Json<ScheduleSnapshot>, Unavailable> {
  match state.mind.data().await.as_ref() {
    None => Err(NOT_LOADED),
    Some(data) => Ok(Json(data.snapshot.clone())),
  }
}

async fn week(State(state): State<AppState>) -> Result<Json<WeekState>, Unavailable> {
  let today = state.clock.now().date();

  match state.mind.data().await.as_ref() {
    None => Err(NOT_LOADED),
    Some(data) => Ok(Json(data.week_state(today))),
  }
}

async fn today(State(state): State<AppState>) -> Result<Json<Today>, Unavailable> {
  let now = state.clock.now();
  let day = StudyDay::from_weekday(now.weekday());

  let data = state.mind.data().await;
  let data = data.as_ref().ok_or(NOT_LOADED)?;
  let week_state = data.week_state(now.date());

  let lessons = match day.and_then(|day| {
    data
      .snapshot
      .week_type
      .day(week_state.current_week_parity, day)
      .map(|lessons| (day, lessons))
  }) {
    None => Vec::new(),
    Some((day, lessons)) => lessons
      .iter()
      .map(|(slot, lesson)| TodayLesson {
        slot: *slot,
        lesson: lesson.clone(),
        progress: lesson.progress(day, now),
      })
      .collect(),
  };

  Ok(Json(Today { day, lessons }))
}

#[cfg(test)]
mod test {
  use std::sync::Arc;

  use axum::extract::State;
  use reqwest::Url;
  use time::UtcOffset;

  use orioks_client::Orioks;

  use crate::mind::{Clock, FeedKind, Mind};
  use crate::server::{health, router, schedule, AppState, NOT_LOADED};

  fn state() -> anyhow::Result<AppState> {
    let orioks = Orioks::new(
      Url::parse("http://127.0.0.1:9/")?,
      Url::parse("http://127.0.0.1:9/")?,
    )?;

    Ok(AppState {
      mind: Arc::new(Mind::new(orioks, "ПИН-21".to_string(), FeedKind::Nested, None)),
      clock: Clock::new(UtcOffset::UTC),
    })
  }

  #[tokio::test]
  async fn not_loaded() -> anyhow::Result<()> {
    let state = state()?;
    let _router = router(state.clone());

    let health = health(State(state.clone())).await;
    assert_eq!(health.0.status, "ok");
    assert!(health.0.last_checked.is_none());

    match schedule(State(state)).await {
      Err(err) => assert_eq!(err, NOT_LOADED),
      Ok(_) => panic!("schedule must not be available before the first update"),
    }

    Ok(())
  }
}
