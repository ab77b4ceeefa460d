use anyhow::Result;
use tracing::{debug, info};

use finder_common::{CandidatePost, Config, SearchCursor};

use crate::matcher::ContentMatcher;
use crate::traits::Timeline;

/// Posts requested per timeline page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Pages searched beyond the first before giving up.
pub const DEFAULT_MAX_DEPTH: u32 = 7;

/// How far back a search is allowed to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPolicy {
    pub page_size: u32,
    pub max_depth: u32,
}

impl SearchPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.search_page_size,
            max_depth: config.search_max_depth,
        }
    }

    /// Upper bound on timeline fetches for one search.
    pub fn max_pages(&self) -> u32 {
        self.max_depth.saturating_add(1)
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Walks a host's timeline backward looking for the prompt post.
pub struct TimelineSearch<'a> {
    timeline: &'a dyn Timeline,
    matcher: &'a dyn ContentMatcher,
    policy: SearchPolicy,
}

impl<'a> TimelineSearch<'a> {
    pub fn new(
        timeline: &'a dyn Timeline,
        matcher: &'a dyn ContentMatcher,
        policy: SearchPolicy,
    ) -> Self {
        Self {
            timeline,
            matcher,
            policy,
        }
    }

    /// Newest original post by `host_id` that looks like a prompt, searching
    /// at most `max_depth + 1` pages. `None` once the horizon or the history
    /// runs out.
    pub async fn find_prompt_post(&self, host_id: &str) -> Result<Option<CandidatePost>> {
        let mut cursor = SearchCursor::start(host_id);

        while cursor.depth <= self.policy.max_depth {
            let page = self
                .timeline
                .page(
                    &cursor.host_id,
                    cursor.before_post_id.as_deref(),
                    self.policy.page_size,
                )
                .await?;

            let Some(oldest) = page.last().map(|p| p.id.clone()) else {
                debug!(host_id, depth = cursor.depth, "Timeline exhausted");
                return Ok(None);
            };

            let found = page
                .into_iter()
                .filter(CandidatePost::is_original)
                .find(|post| self.matcher.is_prompt_post(&post.text));

            if let Some(post) = found {
                info!(host_id, post_id = post.id.as_str(), depth = cursor.depth, "Found prompt post");
                return Ok(Some(post));
            }

            debug!(host_id, depth = cursor.depth, before = oldest.as_str(), "No prompt in page, going deeper");
            cursor.advance(&oldest);
        }

        info!(
            host_id,
            pages = self.policy.max_pages(),
            "Search horizon reached without finding the prompt"
        );
        Ok(None)
    }
}
