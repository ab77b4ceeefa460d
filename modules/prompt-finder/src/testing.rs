// Test mocks for the finder.
//
// Two mocks matching the two trait boundaries:
// - MockStore (PromptStore): stateful in-memory backend with a call log
// - MockTimeline (Timeline): per-host post lists paged by cursor
//
// Plus builders for candidate posts and dates.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use finder_common::{CandidatePost, Discovery, Host, LatestRecord, MediaAttachment};
use prompt_api_client::ApiError;

use crate::traits::{PromptStore, Timeline};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Host id used by most tests.
pub const HOST_ID: &str = "1234567890";

/// Text that the default matcher recognizes as a prompt with word "Lantern".
pub const PROMPT_TEXT: &str = "#vss365 prompt: #Lantern";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, hour, minute, 0).unwrap()
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// Every call the finder made against the store, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    LatestRecord,
    HostsOn(NaiveDate),
    CreatePrompt(String),
    Broadcast(NaiveDate),
    GenerateArchive,
    Timings,
}

/// In-memory store. Hosts not registered for a date answer 404, like the backend.
/// Builder pattern: `.with_latest()`, `.on_host()`, `.failing_*()`.
pub struct MockStore {
    latest: Mutex<Option<LatestRecord>>,
    hosts: HashMap<NaiveDate, Vec<Host>>,
    host_failures: HashMap<NaiveDate, u16>,
    timings: Vec<String>,
    fail_create: bool,
    fail_broadcast: bool,
    fail_archive: bool,
    calls: Mutex<Vec<StoreCall>>,
    created: Mutex<Vec<Discovery>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            hosts: HashMap::new(),
            host_failures: HashMap::new(),
            timings: Vec::new(),
            fail_create: false,
            fail_broadcast: false,
            fail_archive: false,
            calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latest(self, date: NaiveDate) -> Self {
        *self.latest.lock().unwrap() = Some(LatestRecord {
            date,
            id: None,
            word: None,
        });
        self
    }

    pub fn on_host(mut self, date: NaiveDate, host_id: &str) -> Self {
        self.hosts.entry(date).or_default().push(Host {
            id: host_id.to_string(),
            handle: None,
            valid_from: Some(date),
            valid_to: None,
        });
        self
    }

    /// Host lookups for `date` answer with `status`.
    pub fn failing_host(mut self, date: NaiveDate, status: u16) -> Self {
        self.host_failures.insert(date, status);
        self
    }

    pub fn with_timings(mut self, timings: &[&str]) -> Self {
        self.timings = timings.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_broadcast(mut self) -> Self {
        self.fail_broadcast = true;
        self
    }

    pub fn failing_archive(mut self) -> Self {
        self.fail_archive = true;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Dates passed to host lookups, in order.
    pub fn host_lookups(&self) -> Vec<NaiveDate> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::HostsOn(date) => Some(date),
                _ => None,
            })
            .collect()
    }

    pub fn broadcasts(&self) -> Vec<NaiveDate> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Broadcast(date) => Some(date),
                _ => None,
            })
            .collect()
    }

    /// Discoveries successfully persisted.
    pub fn created(&self) -> Vec<Discovery> {
        self.created.lock().unwrap().clone()
    }

    fn log(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn server_error() -> ApiError {
        ApiError::Api {
            status: 500,
            message: "MockStore: injected failure".to_string(),
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptStore for MockStore {
    async fn latest_record(&self) -> Result<Option<LatestRecord>, ApiError> {
        self.log(StoreCall::LatestRecord);
        Ok(self.latest.lock().unwrap().clone())
    }

    async fn hosts_on(&self, date: NaiveDate) -> Result<Vec<Host>, ApiError> {
        self.log(StoreCall::HostsOn(date));
        if let Some(status) = self.host_failures.get(&date) {
            return Err(ApiError::Api {
                status: *status,
                message: format!("MockStore: host lookup for {date} fails"),
            });
        }
        self.hosts.get(&date).cloned().ok_or_else(|| ApiError::Api {
            status: 404,
            message: format!("MockStore: no host for {date}"),
        })
    }

    async fn create_prompt(&self, discovery: &Discovery) -> Result<(), ApiError> {
        self.log(StoreCall::CreatePrompt(discovery.post_id.clone()));
        if self.fail_create {
            return Err(Self::server_error());
        }
        self.created.lock().unwrap().push(discovery.clone());
        *self.latest.lock().unwrap() = Some(LatestRecord {
            date: discovery.date,
            id: Some(discovery.post_id.clone()),
            word: Some(discovery.word.clone()),
        });
        Ok(())
    }

    async fn broadcast(&self, date: NaiveDate) -> Result<(), ApiError> {
        self.log(StoreCall::Broadcast(date));
        if self.fail_broadcast {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn generate_archive(&self) -> Result<(), ApiError> {
        self.log(StoreCall::GenerateArchive);
        if self.fail_archive {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn timings(&self) -> Result<Vec<String>, ApiError> {
        self.log(StoreCall::Timings);
        Ok(self.timings.clone())
    }
}

// ---------------------------------------------------------------------------
// MockTimeline
// ---------------------------------------------------------------------------

/// Per-host post lists (newest first) served in pages. An unknown cursor
/// yields an empty page. Counts every fetch.
pub struct MockTimeline {
    timelines: HashMap<String, Vec<CandidatePost>>,
    fetches: Mutex<Vec<(String, Option<String>)>>,
    served: Mutex<usize>,
}

impl MockTimeline {
    pub fn new() -> Self {
        Self {
            timelines: HashMap::new(),
            fetches: Mutex::new(Vec::new()),
            served: Mutex::new(0),
        }
    }

    pub fn on_timeline(mut self, user_id: &str, posts: Vec<CandidatePost>) -> Self {
        self.timelines.insert(user_id.to_string(), posts);
        self
    }

    /// `(user_id, before)` of every page fetch, in order.
    pub fn fetches(&self) -> Vec<(String, Option<String>)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    /// Total posts handed out across all pages.
    pub fn posts_served(&self) -> usize {
        *self.served.lock().unwrap()
    }
}

impl Default for MockTimeline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Timeline for MockTimeline {
    async fn page(
        &self,
        user_id: &str,
        before: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<CandidatePost>> {
        self.fetches
            .lock()
            .unwrap()
            .push((user_id.to_string(), before.map(str::to_string)));

        let posts = self
            .timelines
            .get(user_id)
            .ok_or_else(|| anyhow!("MockTimeline: no timeline registered for {user_id}"))?;

        let start = match before {
            None => 0,
            Some(id) => match posts.iter().position(|p| p.id == id) {
                Some(idx) => idx + 1,
                None => posts.len(),
            },
        };

        let page: Vec<CandidatePost> = posts
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        *self.served.lock().unwrap() += page.len();
        Ok(page)
    }

    async fn post(&self, post_id: &str) -> Result<CandidatePost> {
        self.timelines
            .values()
            .flatten()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or_else(|| anyhow!("MockTimeline: no post {post_id}"))
    }
}

// ---------------------------------------------------------------------------
// Post builders
// ---------------------------------------------------------------------------

/// An original post by [`HOST_ID`].
pub fn post(id: &str, created_at: DateTime<Utc>, text: &str) -> CandidatePost {
    CandidatePost {
        id: id.to_string(),
        author_id: HOST_ID.to_string(),
        created_at,
        text: text.to_string(),
        is_repost: false,
        is_quote_repost: false,
        media: Vec::new(),
    }
}

pub fn repost(id: &str, created_at: DateTime<Utc>, text: &str) -> CandidatePost {
    CandidatePost {
        is_repost: true,
        ..post(id, created_at, text)
    }
}

pub fn quote_repost(id: &str, created_at: DateTime<Utc>, text: &str) -> CandidatePost {
    CandidatePost {
        is_quote_repost: true,
        ..post(id, created_at, text)
    }
}

/// Attach a photo whose short link appears at the end of the text.
pub fn with_photo(mut post: CandidatePost, url: &str, short_link: &str) -> CandidatePost {
    post.text = format!("{} {}", post.text, short_link);
    post.media.push(MediaAttachment {
        kind: "photo".to_string(),
        url: Some(url.to_string()),
        alt_text: None,
        short_link: Some(short_link.to_string()),
    });
    post
}

/// `count` non-prompt originals, newest first, one hour apart ending at `newest`.
/// Ids are `{prefix}-0`, `{prefix}-1`, ...
pub fn chatter(prefix: &str, count: usize, newest: DateTime<Utc>) -> Vec<CandidatePost> {
    (0..count)
        .map(|i| {
            post(
                &format!("{prefix}-{i}"),
                newest - Duration::hours(i as i64),
                "Good morning writers! Coffee first.",
            )
        })
        .collect()
}
