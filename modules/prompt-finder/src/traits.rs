// Trait seams for the finder's two remote collaborators.
//
// PromptStore: the prompt archive backend.
// Timeline:    a host's post history on the social provider.
//
// Both have production impls below and in-memory mocks in `testing.rs`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

use finder_common::{CandidatePost, Discovery, Host, LatestRecord, MediaAttachment};
use prompt_api_client::{ApiError, PromptApiClient};
use twitter_client::{Media, Tweet, TwitterClient};

// ---------------------------------------------------------------------------
// PromptStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Most recently recorded prompt, `None` on an empty archive.
    async fn latest_record(&self) -> Result<Option<LatestRecord>, ApiError>;

    /// Hosts scoped to exactly `date`.
    async fn hosts_on(&self, date: NaiveDate) -> Result<Vec<Host>, ApiError>;

    async fn create_prompt(&self, discovery: &Discovery) -> Result<(), ApiError>;

    /// Trigger the notification broadcast for `date`.
    async fn broadcast(&self, date: NaiveDate) -> Result<(), ApiError>;

    /// Trigger regeneration of the archive snapshot.
    async fn generate_archive(&self) -> Result<(), ApiError>;

    /// Scheduled run times as `"MINUTE HOUR"` strings.
    async fn timings(&self) -> Result<Vec<String>, ApiError>;
}

#[async_trait]
impl PromptStore for PromptApiClient {
    async fn latest_record(&self) -> Result<Option<LatestRecord>, ApiError> {
        self.latest_record().await
    }

    async fn hosts_on(&self, date: NaiveDate) -> Result<Vec<Host>, ApiError> {
        self.hosts_on(date).await
    }

    async fn create_prompt(&self, discovery: &Discovery) -> Result<(), ApiError> {
        self.create_prompt(discovery).await
    }

    async fn broadcast(&self, date: NaiveDate) -> Result<(), ApiError> {
        self.broadcast(date).await
    }

    async fn generate_archive(&self) -> Result<(), ApiError> {
        self.generate_archive().await
    }

    async fn timings(&self) -> Result<Vec<String>, ApiError> {
        self.timings().await
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Timeline: Send + Sync {
    /// Up to `page_size` of `user_id`'s posts, newest first, strictly older
    /// than `before` when given.
    async fn page(
        &self,
        user_id: &str,
        before: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<CandidatePost>>;

    /// A single post by id.
    async fn post(&self, post_id: &str) -> Result<CandidatePost>;
}

#[async_trait]
impl Timeline for TwitterClient {
    async fn page(
        &self,
        user_id: &str,
        before: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<CandidatePost>> {
        let page = self.user_tweets(user_id, before, page_size).await?;
        Ok(page
            .tweets
            .iter()
            .map(|tweet| {
                let media = page.media_for(tweet);
                to_candidate(tweet, &media, user_id)
            })
            .collect())
    }

    async fn post(&self, post_id: &str) -> Result<CandidatePost> {
        let found = self.tweet(post_id).await?;
        let author_id = found
            .tweet
            .author_id
            .clone()
            .ok_or_else(|| anyhow!("tweet {post_id} has no author_id"))?;
        Ok(to_candidate(&found.tweet, &found.media, &author_id))
    }
}

fn to_candidate(tweet: &Tweet, media: &[Media], fallback_author: &str) -> CandidatePost {
    CandidatePost {
        id: tweet.id.clone(),
        author_id: tweet
            .author_id
            .clone()
            .unwrap_or_else(|| fallback_author.to_string()),
        created_at: tweet.created_at,
        text: tweet.text.clone(),
        is_repost: tweet.is_retweet(),
        is_quote_repost: tweet.is_quote(),
        media: media
            .iter()
            .map(|m| MediaAttachment {
                kind: m.kind.clone(),
                url: m.best_url().map(str::to_string),
                alt_text: m.alt_text.clone(),
                short_link: tweet.short_link_for(&m.media_key).map(str::to_string),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quoted_tweet_with_photo() -> (Tweet, Vec<Media>) {
        let tweet: Tweet = serde_json::from_value(json!({
            "id": "1350000000000000007",
            "text": "#vss365 prompt: #Ember https://t.co/q1",
            "created_at": "2021-01-16T06:00:00.000Z",
            "referenced_tweets": [{"type": "quoted", "id": "1349"}],
            "attachments": {"media_keys": ["3_7"]},
            "entities": {"urls": [{"url": "https://t.co/q1", "media_key": "3_7"}]}
        }))
        .unwrap();
        let media: Vec<Media> = serde_json::from_value(json!([
            {"media_key": "3_7", "type": "photo", "url": "https://pbs.twimg.com/media/e.jpg", "alt_text": "embers"}
        ]))
        .unwrap();
        (tweet, media)
    }

    #[test]
    fn quoted_tweet_maps_to_quote_repost_with_short_link() {
        let (tweet, media) = quoted_tweet_with_photo();

        let post = to_candidate(&tweet, &media, "42");

        assert_eq!(post.id, "1350000000000000007");
        assert_eq!(post.author_id, "42");
        assert!(post.is_quote_repost);
        assert!(!post.is_repost);
        assert!(!post.is_original());
        assert_eq!(post.media.len(), 1);
        assert!(post.media[0].is_photo());
        assert_eq!(post.media[0].url.as_deref(), Some("https://pbs.twimg.com/media/e.jpg"));
        assert_eq!(post.media[0].alt_text.as_deref(), Some("embers"));
        assert_eq!(post.media[0].short_link.as_deref(), Some("https://t.co/q1"));
    }

    #[test]
    fn tweet_author_wins_over_fallback() {
        let (mut tweet, media) = quoted_tweet_with_photo();
        tweet.author_id = Some("77".to_string());

        assert_eq!(to_candidate(&tweet, &media, "42").author_id, "77");
    }
}
