use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};

use finder_common::{CandidatePost, Discovery};

use crate::hosts::{HostResolver, HostRule};
use crate::matcher::{self, ContentMatcher};
use crate::reconcile::{DateReconciler, DayOffsetHeuristic};
use crate::search::{SearchPolicy, TimelineSearch};
use crate::traits::{PromptStore, Timeline};
use crate::types::{AbortReason, RunOutcome};

/// Finds the day's prompt post and records it in the store at most once per day.
///
/// Overlapping runs are not locked against each other. The latest-record
/// checks at the start of a run and after reconciliation turn a late
/// duplicate into `AlreadyRecordedToday`.
pub struct PromptFinder {
    store: Arc<dyn PromptStore>,
    timeline: Arc<dyn Timeline>,
    matcher: Arc<dyn ContentMatcher>,
    reconciler: Box<dyn DateReconciler>,
    policy: SearchPolicy,
}

impl PromptFinder {
    pub fn new(
        store: Arc<dyn PromptStore>,
        timeline: Arc<dyn Timeline>,
        matcher: Arc<dyn ContentMatcher>,
    ) -> Self {
        Self {
            store,
            timeline,
            matcher,
            reconciler: Box::new(DayOffsetHeuristic),
            policy: SearchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_reconciler(mut self, reconciler: impl DateReconciler + 'static) -> Self {
        self.reconciler = Box::new(reconciler);
        self
    }

    pub fn store(&self) -> &dyn PromptStore {
        self.store.as_ref()
    }

    pub(crate) fn timeline(&self) -> &dyn Timeline {
        self.timeline.as_ref()
    }

    /// Run one discovery for the local calendar day `today`.
    ///
    /// Business negatives come back as `RunOutcome::Aborted`. `Err` is
    /// reserved for faults: an unreadable latest record, a failing or
    /// malformed timeline.
    pub async fn run(&self, today: NaiveDate) -> Result<RunOutcome> {
        let latest = self.store.latest_record().await?;
        if let Some(latest) = &latest {
            if latest.date == today {
                return Ok(aborted(AbortReason::AlreadyRecordedToday { date: today }));
            }
        }

        let rule = HostRule::for_date(today);
        let host = match HostResolver::new(self.store.as_ref()).resolve(today, rule).await {
            Ok(host) => host,
            Err(e) => {
                return Ok(aborted(AbortReason::HostResolutionFailed {
                    date: today,
                    reason: e.to_string(),
                }))
            }
        };

        info!(host_id = host.id.as_str(), %rule, %today, "Searching for the latest prompt post");
        let search = TimelineSearch::new(self.timeline.as_ref(), self.matcher.as_ref(), self.policy);
        let Some(post) = search.find_prompt_post(&host.id).await? else {
            return Ok(aborted(AbortReason::NotFound { host_id: host.id }));
        };

        let date = self.reconciler.reconcile(post.created_at, today).date_naive();
        if latest.as_ref().map(|l| l.date) == Some(date) {
            // The newest post is still the one already recorded; today's
            // prompt has not gone out yet.
            return Ok(aborted(AbortReason::AlreadyRecordedToday { date }));
        }

        match self.build_discovery(&post, date) {
            Ok(discovery) => Ok(self.record(discovery).await),
            Err(reason) => Ok(aborted(reason)),
        }
    }

    /// Assemble the stored record for `post` on `date`.
    pub(crate) fn build_discovery(
        &self,
        post: &CandidatePost,
        date: NaiveDate,
    ) -> Result<Discovery, AbortReason> {
        let text = matcher::post_text(post);
        let word = self
            .matcher
            .extract_prompt_word(&text)
            .ok_or_else(|| AbortReason::WordExtractionFailed {
                post_id: post.id.clone(),
            })?;

        Ok(Discovery {
            post_id: post.id.clone(),
            author_id: post.author_id.clone(),
            date,
            word,
            content: matcher::escape_html(&text),
            media: matcher::primary_media(post),
        })
    }

    /// Persist `discovery`, then trigger the broadcast. A failed broadcast
    /// still counts as recorded.
    pub(crate) async fn record(&self, discovery: Discovery) -> RunOutcome {
        info!(
            post_id = discovery.post_id.as_str(),
            word = discovery.word.as_str(),
            date = %discovery.date,
            "Adding prompt to the store"
        );
        if let Err(e) = self.store.create_prompt(&discovery).await {
            return aborted(AbortReason::PersistenceFailed {
                date: discovery.date,
                reason: e.to_string(),
            });
        }

        info!(date = %discovery.date, "Sending out notifications");
        if let Err(e) = self.store.broadcast(discovery.date).await {
            warn!(error = %e, date = %discovery.date, "Broadcast failed");
        }

        RunOutcome::Recorded(discovery)
    }
}

fn aborted(reason: AbortReason) -> RunOutcome {
    match &reason {
        AbortReason::HostResolutionFailed { .. } | AbortReason::PersistenceFailed { .. } => {
            warn!(%reason, "Aborting")
        }
        _ => info!(%reason, "Aborting"),
    }
    RunOutcome::Aborted(reason)
}
