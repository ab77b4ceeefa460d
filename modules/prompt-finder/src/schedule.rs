//! Daily schedule: discovery at each configured time, archive rotation
//! five minutes after the last one.
//!
//! ```text
//! settings/timings ["30 7", "0 12"]
//!     ├─► 07:30 ─► PromptFinder::run(today)
//!     ├─► 12:00 ─► PromptFinder::run(today)
//!     └─► 12:05 ─► ArchiveRotation::rotate()
//! ```
//!
//! Runs may overlap if a search is still paging when the next time fires.
//! No lock is taken; the latest-record check makes the late run a no-op.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveTime, TimeDelta, Timelike};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::archive::ArchiveRotation;
use crate::discovery::PromptFinder;
use crate::traits::PromptStore;

/// Delay between the last discovery run and archive rotation.
pub const ARCHIVE_DELAY_MINUTES: i64 = 5;

/// A local wall-clock time of day, as stored in `settings/timings` (`"MINUTE HOUR"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTime {
    pub hour: u32,
    pub minute: u32,
}

impl RunTime {
    /// Six-field cron expression firing daily at this time.
    pub fn cron(&self) -> String {
        format!("0 {} {} * * *", self.minute, self.hour)
    }

    /// This time shifted by `minutes`, wrapping past midnight.
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        let start = NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN);
        let (shifted, _) = start.overflowing_add_signed(TimeDelta::minutes(minutes));
        Self {
            hour: shifted.hour(),
            minute: shifted.minute(),
        }
    }
}

impl FromStr for RunTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (Some(minute), Some(hour), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("expected \"MINUTE HOUR\", got {s:?}");
        };
        let minute: u32 = minute.parse().with_context(|| format!("bad minute in {s:?}"))?;
        let hour: u32 = hour.parse().with_context(|| format!("bad hour in {s:?}"))?;
        if minute > 59 || hour > 23 {
            bail!("time out of range: {s:?}");
        }
        Ok(Self { hour, minute })
    }
}

impl fmt::Display for RunTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parse the stored timings, rejecting an empty list.
pub fn parse_timings(raw: &[String]) -> Result<Vec<RunTime>> {
    if raw.is_empty() {
        bail!("no run timings configured in settings/timings");
    }
    raw.iter().map(|t| t.parse()).collect()
}

/// When archive rotation runs: a few minutes after the last listed timing.
pub fn archive_time(timings: &[RunTime]) -> Option<RunTime> {
    timings.last().map(|t| t.plus_minutes(ARCHIVE_DELAY_MINUTES))
}

/// Load timings from the store and start the scheduler. The caller keeps the
/// returned scheduler alive.
pub async fn start_scheduler(
    store: Arc<dyn PromptStore>,
    finder: Arc<PromptFinder>,
    rotation: Arc<ArchiveRotation>,
) -> Result<JobScheduler> {
    let raw = store.timings().await.context("loading run timings")?;
    let timings = parse_timings(&raw)?;
    let scheduler = JobScheduler::new().await?;

    for time in &timings {
        let finder = finder.clone();
        let job = Job::new_async_tz(time.cron().as_str(), Local, move |_uuid, _lock| {
            let finder = finder.clone();
            Box::pin(async move {
                let today = Local::now().date_naive();
                match finder.run(today).await {
                    Ok(outcome) => info!(%outcome, "Scheduled discovery finished"),
                    Err(e) => error!(error = %e, "Scheduled discovery failed"),
                }
            })
        })?;
        scheduler.add(job).await?;
        info!(at = %time, "Scheduled discovery");
    }

    if let Some(time) = archive_time(&timings) {
        let job = Job::new_async_tz(time.cron().as_str(), Local, move |_uuid, _lock| {
            let rotation = rotation.clone();
            Box::pin(async move {
                if let Err(e) = rotation.rotate().await {
                    error!(error = %e, "Scheduled archive rotation failed");
                }
            })
        })?;
        scheduler.add(job).await?;
        info!(at = %time, "Scheduled archive rotation");
    }

    scheduler.start().await?;
    Ok(scheduler)
}
