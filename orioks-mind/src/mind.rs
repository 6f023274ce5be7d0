use anyhow::anyhow;
use clap::ValueEnum;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use orioks_client::{find_group, Orioks};
use orioks_schedule::{parse_semester_start, Feed, ScheduleSnapshot, WeekState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeedKind {
  /// Public MIET schedule, looked up by group name.
  Nested,
  /// ORIOKS group schedule, requires a token.
  Flat,
}

/// Local wall clock, the offset is resolved once at startup.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
  offset: UtcOffset,
}

impl Clock {
  pub fn new(offset: UtcOffset) -> Self {
    Self { offset }
  }

  pub fn now(&self) -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc().to_offset(self.offset);
    PrimitiveDateTime::new(now.date(), now.time())
  }
}

pub struct Mind {
  orioks: Orioks,
  group: String,
  feed: FeedKind,
  semester_start: Option<String>,
  data: RwLock<Option<Data>>,
}

pub struct Data {
  pub last_checked: PrimitiveDateTime,
  pub semester_start: Option<Date>,
  pub snapshot: ScheduleSnapshot,
}

impl Data {
  pub fn week_state(&self, today: Date) -> WeekState {
    match self.semester_start {
      Some(semester_start) => WeekState::from_baseline(semester_start, today),
      None => WeekState::fallback(),
    }
  }
}

impl Mind {
  pub fn new(
    orioks: Orioks,
    group: String,
    feed: FeedKind,
    semester_start: Option<String>,
  ) -> Self {
    Self {
      orioks,
      group,
      feed,
      semester_start,
      data: RwLock::new(None),
    }
  }

  pub fn group(&self) -> &str {
    &self.group
  }

  pub async fn data(&self) -> RwLockReadGuard<'_, Option<Data>> {
    self.data.read().await
  }

  /// Fetches and normalizes the schedule, returns whether it changed. A failed
  /// update leaves the previous data in place.
  pub async fn update(&self, now: PrimitiveDateTime) -> anyhow::Result<bool> {
    let feed = self.fetch_feed().await?;
    let semester_start = self.resolve_semester_start(feed.semester()).await;
    let snapshot = ScheduleSnapshot::new(feed, now);

    info!(
      "Fetched {} lessons for {} ({})",
      snapshot.week_type.len(),
      self.group,
      snapshot.semester
    );

    Ok(self.apply(snapshot, semester_start, now).await)
  }

  /// Stores a freshly fetched snapshot, returns whether it differs from the
  /// one already held.
  async fn apply(
    &self,
    snapshot: ScheduleSnapshot,
    semester_start: Option<Date>,
    now: PrimitiveDateTime,
  ) -> bool {
    let mut data = self.data.write().await;

    // check if there is a difference
    if let Some(data) = data.as_mut() {
      if data.snapshot.week_type == snapshot.week_type && data.semester_start == semester_start {
        data.last_checked = now;
        return false;
      }
    }

    *data = Some(Data {
      last_checked: now,
      semester_start,
      snapshot,
    });

    true
  }

  async fn fetch_feed(&self) -> anyhow::Result<Feed> {
    match self.feed {
      FeedKind::Nested => Ok(Feed::Nested(self.orioks.schedule_data(&self.group).await?)),
      FeedKind::Flat => {
        let groups = self.orioks.groups().await?;
        let group = match find_group(&groups, &self.group) {
          None => return Err(anyhow!("Unknown group {}", self.group)),
          Some(group) => group,
        };

        let timetable = match self.orioks.timetable().await {
          Ok(timetable) if !timetable.is_empty() => timetable,
          Ok(_) => Default::default(),
          Err(err) => {
            warn!("Using default bell schedule, timetable unavailable: {}", err);
            Default::default()
          }
        };

        Ok(Feed::Flat {
          items: self.orioks.group_schedule(group.id).await?,
          timetable,
        })
      }
    }
  }

  /// Semester start from the command line, or from ORIOKS when logged in.
  async fn resolve_semester_start(&self, semester: Option<&str>) -> Option<Date> {
    let raw = match &self.semester_start {
      Some(raw) => raw.clone(),
      None if self.orioks.is_authenticated() => match self.orioks.schedule_meta().await {
        Ok(meta) => meta.semester_start,
        Err(err) => {
          warn!("Unable to fetch schedule meta: {}", err);
          return None;
        }
      },
      None => {
        warn!(
          "No semester start known for {}, showing week type 0",
          semester.unwrap_or(&self.group)
        );
        return None;
      }
    };

    match parse_semester_start(&raw) {
      Ok(date) => Some(date),
      Err(err) => {
        warn!("{}, showing week type 0", err);
        None
      }
    }
  }
}
