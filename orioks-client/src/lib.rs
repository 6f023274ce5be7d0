use anyhow::{anyhow, Context};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use orioks_schedule::{FlatItem, NestedResponse, SlotTimetable};

pub const ORIOKS_URL: &str = "https://orioks.miet.ru/";
pub const MIET_URL: &str = "https://miet.ru/";

pub struct Orioks {
  client: Client,
  base: Url,
  schedule_base: Url,
  token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
  token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub course: i64,
  pub department: String,
  pub full_name: String,
  pub group: String,
  pub record_book_id: i64,
  pub semester: i64,
  pub study_direction: String,
  pub study_profile: String,
  pub year: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
  pub id: i64,
  pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMeta {
  pub semester_start: String,
}

impl Orioks {
  /// `base` serves the ORIOKS API, `schedule_base` the MIET schedule.
  pub fn new(base: Url, schedule_base: Url) -> anyhow::Result<Self> {
    let client = Client::builder()
      .user_agent(concat!("orioks-mind/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      client,
      base: directory(base),
      schedule_base: directory(schedule_base),
      token: None,
    })
  }

  pub fn with_token(mut self, token: impl Into<String>) -> Self {
    self.token = Some(token.into());
    self
  }

  pub fn is_authenticated(&self) -> bool {
    self.token.is_some()
  }

  pub fn token(&self) -> Option<&str> {
    self.token.as_deref()
  }

  /// Exchanges credentials for a token and keeps it for later calls.
  pub async fn login(&mut self, username: &str, password: &str) -> anyhow::Result<String> {
    let request = self
      .client
      .get(self.base.join("api/v1/auth")?)
      .basic_auth(username, Some(password));

    let response: AuthResponse = send(request).await?;
    info!("Logged in to {} as {}", self.base, username);

    self.token = Some(response.token.clone());
    Ok(response.token)
  }

  pub async fn student(&self) -> anyhow::Result<Student> {
    self.get("api/v1/student").await
  }

  pub async fn groups(&self) -> anyhow::Result<Vec<GroupInfo>> {
    self.get("api/v1/schedule/groups").await
  }

  pub async fn group_schedule(&self, group_id: i64) -> anyhow::Result<Vec<FlatItem>> {
    self
      .get(&format!("api/v1/schedule/groups/{}", group_id))
      .await
  }

  pub async fn timetable(&self) -> anyhow::Result<SlotTimetable> {
    self.get("api/v1/schedule/timetable").await
  }

  pub async fn schedule_meta(&self) -> anyhow::Result<ScheduleMeta> {
    self.get("api/v1/schedule").await
  }

  /// Nested schedule of the public MIET endpoint, no token required.
  pub async fn schedule_data(&self, group_name: &str) -> anyhow::Result<NestedResponse> {
    let request = self
      .client
      .post(self.schedule_base.join("schedule/data")?)
      .form(&[("group", group_name)]);

    send(request).await
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
    let token = match &self.token {
      None => return Err(anyhow!("not authenticated, a token is required for {path}")),
      Some(token) => token,
    };

    let request = self.client.get(self.base.join(path)?).bearer_auth(token);
    send(request).await
  }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> anyhow::Result<T> {
  let response = request
    .header(ACCEPT, "application/json")
    .send()
    .await?
    .error_for_status()?;

  let url = response.url().clone();
  let text = response.text().await?;
  debug!("Fetched {} ({} bytes)", url, text.len());

  serde_json::from_str(&text).with_context(|| format!("unexpected response body from {url}"))
}

/// Makes sure relative joins append to the path instead of replacing its
/// last segment.
fn directory(mut url: Url) -> Url {
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  url
}

/// Finds a group by name, ignoring the ` (...)` annotation ORIOKS appends to
/// some group names.
pub fn find_group<'a>(groups: &'a [GroupInfo], name: &str) -> Option<&'a GroupInfo> {
  groups.iter().find(|group| {
    let trimmed = match group.name.split_once(" (") {
      None => group.name.as_str(),
      Some((trimmed, _)) => trimmed,
    };
    trimmed.trim() == name.trim()
  })
}
