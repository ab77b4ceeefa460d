use std::fmt;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use finder_common::Host;
use prompt_api_client::ApiError;

use crate::traits::PromptStore;

/// First year in which hosts rotate twice a month.
pub const BIWEEKLY_ERA_START_YEAR: i32 = 2021;

/// How hosting periods were carved up at a given point in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRule {
    /// One host per calendar month. Individual days may be scoped to a
    /// different host, so the exact day is tried before the month.
    Legacy,
    /// Two hosts per month: days 1-15 and 16-end, or 1-14 and 15-end in February.
    Biweekly,
}

impl HostRule {
    pub fn for_date(date: NaiveDate) -> Self {
        if date.year() >= BIWEEKLY_ERA_START_YEAR {
            Self::Biweekly
        } else {
            Self::Legacy
        }
    }
}

impl fmt::Display for HostRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Biweekly => write!(f, "biweekly"),
        }
    }
}

/// Start of the two-host period containing `date`.
pub fn biweekly_period_start(date: NaiveDate) -> NaiveDate {
    let second_half = if date.month() == 2 { 15 } else { 16 };
    let day = if date.day() >= second_half { second_half } else { 1 };
    with_day(date, day)
}

/// First day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    with_day(date, 1)
}

fn with_day(date: NaiveDate, day: u32) -> NaiveDate {
    // Days 1, 15 and 16 exist in every month.
    date.with_day(day).unwrap_or(date)
}

#[derive(Debug, Error)]
pub enum HostResolutionError {
    #[error("no host scoped to {date}")]
    NotFound { date: NaiveDate },

    #[error("host lookup for {date} failed: {source}")]
    Request {
        date: NaiveDate,
        #[source]
        source: ApiError,
    },
}

/// Works out which host owns a given day.
pub struct HostResolver<'a> {
    store: &'a dyn PromptStore,
}

impl<'a> HostResolver<'a> {
    pub fn new(store: &'a dyn PromptStore) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        date: NaiveDate,
        rule: HostRule,
    ) -> Result<Host, HostResolutionError> {
        match rule {
            HostRule::Legacy => self.resolve_legacy(date).await,
            HostRule::Biweekly => {
                let period = biweekly_period_start(date);
                debug!(%date, %period, "Resolving biweekly host");
                self.lookup(period)
                    .await?
                    .ok_or(HostResolutionError::NotFound { date: period })
            }
        }
    }

    async fn resolve_legacy(&self, date: NaiveDate) -> Result<Host, HostResolutionError> {
        match self.lookup(date).await {
            Ok(Some(host)) => return Ok(host),
            Ok(None) => {}
            Err(HostResolutionError::Request { source, .. }) if source.is_request_failure() => {
                debug!(%date, error = %source, "Day host lookup failed, falling back to month");
            }
            Err(e) => return Err(e),
        }

        let month = month_start(date);
        info!(%date, %month, "No host scoped to the day, using the month's host");
        self.lookup(month)
            .await?
            .ok_or(HostResolutionError::NotFound { date: month })
    }

    /// One store lookup. 404 and an empty list both mean "nobody".
    async fn lookup(&self, date: NaiveDate) -> Result<Option<Host>, HostResolutionError> {
        match self.store.hosts_on(date).await {
            Ok(hosts) => Ok(hosts.into_iter().next()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(source) => Err(HostResolutionError::Request { date, source }),
        }
    }
}
