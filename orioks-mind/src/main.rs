use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use reqwest::Url;
use time::UtcOffset;
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use orioks_client::{Orioks, MIET_URL, ORIOKS_URL};

use crate::ascii::{student, table};
use crate::mind::{Clock, FeedKind, Mind};
use crate::server::{router, AppState};

mod ascii;
mod mind;
mod server;

const REFRESH_MINUTES: u64 = 15;

#[derive(Parser)]
#[command(author, version, about, long_about)]
struct Args {
  #[arg(long, env = "ORIOKS_MIND_ORIOKS_URL", default_value = ORIOKS_URL)]
  orioks_url: Url,
  #[arg(long, env = "ORIOKS_MIND_SCHEDULE_URL", default_value = MIET_URL)]
  schedule_url: Url,
  #[arg(long, short, env = "ORIOKS_MIND_TOKEN")]
  token: Option<String>,
  #[arg(long, short, env = "ORIOKS_MIND_USERNAME")]
  username: Option<String>,
  #[arg(long, short, env = "ORIOKS_MIND_PASSWORD")]
  password: Option<String>,
  /// Defaults to the group of the logged in student.
  #[arg(long, short, env = "ORIOKS_MIND_GROUP")]
  group: Option<String>,
  #[arg(long, value_enum, env = "ORIOKS_MIND_FEED", default_value = "nested")]
  feed: FeedKind,
  /// yyyy-MM-dd, overrides the semester start reported by ORIOKS.
  #[arg(long, env = "ORIOKS_MIND_SEMESTER_START")]
  semester_start: Option<String>,
  #[arg(long, env = "ORIOKS_MIND_SENTRY_DSN")]
  sentry_dsn: Option<String>,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Print the rest of the current week.
  Show {
    /// Keep redrawing, refetching every 15 minutes.
    #[arg(long, short)]
    watch: bool,
    /// Seconds between redraws.
    #[arg(long, short, default_value_t = 60)]
    interval: u64,
  },
  /// Print the logged in student and the session token.
  Whoami,
  /// Serve the schedule as JSON.
  Serve {
    #[arg(long, short, env = "ORIOKS_MIND_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
  },
}

fn main() -> anyhow::Result<()> {
  // the local offset can only be determined soundly while single threaded
  let offset = UtcOffset::current_local_offset();
  let args = Args::parse();

  let _sentry = args.sentry_dsn.as_deref().map(|dsn| {
    sentry::init((
      dsn,
      sentry::ClientOptions {
        release: sentry::release_name!(),
        ..Default::default()
      },
    ))
  });

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(sentry_tracing::layer())
    .init();

  let offset = offset.unwrap_or_else(|_| {
    warn!("Unable to determine local offset, using UTC");
    UtcOffset::UTC
  });

  tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()?
    .block_on(run(args, Clock::new(offset)))
}

async fn run(args: Args, clock: Clock) -> anyhow::Result<()> {
  if let Command::Whoami = args.command {
    return whoami(&args).await;
  }

  let mind = Arc::new(connect(&args).await?);

  match args.command {
    Command::Show { watch, interval } => show(&mind, clock, watch, interval).await,
    Command::Serve { listen } => serve(mind, clock, listen).await,
    Command::Whoami => Ok(()),
  }
}

async fn login(args: &Args) -> anyhow::Result<Orioks> {
  let mut orioks = Orioks::new(args.orioks_url.clone(), args.schedule_url.clone())?;

  match (&args.token, &args.username, &args.password) {
    (Some(token), _, _) => orioks = orioks.with_token(token.as_str()),
    (None, Some(username), Some(password)) => {
      orioks.login(username, password).await?;
    }
    _ => info!("No ORIOKS credentials given, using the public schedule only"),
  }

  Ok(orioks)
}

async fn whoami(args: &Args) -> anyhow::Result<()> {
  let orioks = login(args).await?;

  let token = match orioks.token() {
    None => return Err(anyhow!("whoami requires a token or a username and password")),
    Some(token) => token,
  };

  print!("{}", student(&orioks.student().await?, token));
  Ok(())
}

async fn connect(args: &Args) -> anyhow::Result<Mind> {
  let orioks = login(args).await?;

  let group = match &args.group {
    Some(group) => group.clone(),
    None if orioks.is_authenticated() => orioks.student().await?.group,
    None => return Err(anyhow!("Either a group or ORIOKS credentials are required")),
  };

  if args.feed == FeedKind::Flat && !orioks.is_authenticated() {
    return Err(anyhow!("The flat ORIOKS feed requires credentials"));
  }

  Ok(Mind::new(
    orioks,
    group,
    args.feed,
    args.semester_start.clone(),
  ))
}

async fn show(mind: &Mind, clock: Clock, watch: bool, interval: u64) -> anyhow::Result<()> {
  mind.update(clock.now()).await?;
  let mut last_update = Instant::now();

  loop {
    let now = clock.now();

    if last_update.elapsed() >= Duration::from_secs(REFRESH_MINUTES * 60) {
      last_update = Instant::now();
      if let Err(err) = mind.update(now).await {
        sentry::integrations::anyhow::capture_anyhow(&err);
        error!("Error updating schedule: {}", err);
      }
    }

    if let Some(data) = mind.data().await.as_ref() {
      let state = data.week_state(now.date());
      print!("{}", table(mind.group(), &data.snapshot, &state, now));
    }

    if !watch {
      return Ok(());
    }

    tokio::time::sleep(Duration::from_secs(interval)).await;
    println!();
  }
}

async fn serve(mind: Arc<Mind>, clock: Clock, listen: SocketAddr) -> anyhow::Result<()> {
  let updater = mind.clone();
  tokio::spawn(async move {
    loop {
      match updater.update(clock.now()).await {
        Err(err) => {
          sentry::integrations::anyhow::capture_anyhow(&err);
          error!("Error updating schedule: {}", err);
        }
        Ok(true) => info!("Detected schedule changes"),
        Ok(false) => info!("Nothing changed"),
      }

      await_next_execution(clock).await;
    }
  });

  let listener = tokio::net::TcpListener::bind(listen).await?;
  info!("Listening on http://{}", listen);

  axum::serve(listener, router(AppState { mind, clock }))
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

  Ok(())
}

async fn await_next_execution(clock: Clock) {
  let now = clock.now();

  let now_min = now.minute() as u64;
  let now_min_to_last = now_min % REFRESH_MINUTES;
  let now_min_to_next = REFRESH_MINUTES - now_min_to_last;
  let now_sec_to_next = now_min_to_next * 60 - now.second() as u64;
  let duration = Duration::from_secs(now_sec_to_next);

  let sleep_until = Instant::now() + duration;
  info!(
    "Next update in {:0>2}:{:0>2} minutes",
    now_sec_to_next / 60,
    now_sec_to_next % 60
  );
  tokio::time::sleep_until(sleep_until).await;
}
