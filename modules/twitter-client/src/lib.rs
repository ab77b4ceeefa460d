pub mod error;
pub mod types;

pub use error::{Result, TwitterError};
pub use types::{
    Attachments, Entities, Includes, Media, ReferencedTweet, TimelinePage, Tweet, TweetWithMedia,
    UrlEntity,
};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use types::{LookupResponse, TimelineResponse, EXPANSIONS, MEDIA_FIELDS, TWEET_FIELDS};

/// Bounds the v2 API places on `max_results` for user timelines.
const MIN_PAGE_SIZE: u32 = 5;
const MAX_PAGE_SIZE: u32 = 100;

pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TwitterClient {
    pub fn with_base_url(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Fetch one page of a user's timeline, newest first.
    ///
    /// `until_id` is exclusive: only tweets older than it are returned.
    pub async fn user_tweets(
        &self,
        user_id: &str,
        until_id: Option<&str>,
        max_results: u32,
    ) -> Result<TimelinePage> {
        let url = format!("{}/users/{}/tweets", self.base_url, user_id);
        let max_results = max_results.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE).to_string();

        let mut query = vec![
            ("max_results", max_results.as_str()),
            ("tweet.fields", TWEET_FIELDS),
            ("expansions", EXPANSIONS),
            ("media.fields", MEDIA_FIELDS),
        ];
        if let Some(until_id) = until_id {
            query.push(("until_id", until_id));
        }

        tracing::debug!(user_id, until_id, "Fetching timeline page");
        let resp: TimelineResponse = self.get(&url, &query).await?;
        tracing::debug!(user_id, count = resp.data.len(), "Fetched timeline page");

        Ok(TimelinePage {
            tweets: resp.data,
            media: resp.includes.media,
        })
    }

    /// Look up a single tweet by id.
    pub async fn tweet(&self, tweet_id: &str) -> Result<TweetWithMedia> {
        let url = format!("{}/tweets/{}", self.base_url, tweet_id);
        let query = [
            ("tweet.fields", TWEET_FIELDS),
            ("expansions", EXPANSIONS),
            ("media.fields", MEDIA_FIELDS),
        ];

        tracing::debug!(tweet_id, "Looking up tweet");
        let resp: LookupResponse = self.get(&url, &query).await?;
        let tweet = resp
            .data
            .ok_or_else(|| TwitterError::NotFound(tweet_id.to_string()))?;
        let media = types::resolve_media(&tweet, &resp.includes.media);

        Ok(TweetWithMedia { tweet, media })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TwitterError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TwitterError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
