use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Fields requested on every tweet lookup.
pub(crate) const TWEET_FIELDS: &str = "id,text,author_id,created_at,referenced_tweets,attachments,entities";

/// Expansions requested alongside tweets so attached media is returned inline.
pub(crate) const EXPANSIONS: &str = "attachments.media_keys";

/// Fields requested on expanded media objects.
pub(crate) const MEDIA_FIELDS: &str = "media_key,type,url,preview_image_url,alt_text";

/// Envelope for `GET /users/:id/tweets`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TimelineResponse {
    #[serde(default)]
    pub data: Vec<Tweet>,
    #[serde(default)]
    pub includes: Includes,
}

/// Envelope for `GET /tweets/:id`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LookupResponse {
    pub data: Option<Tweet>,
    #[serde(default)]
    pub includes: Includes,
}

/// Expanded objects referenced from the tweets in a response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub media: Vec<Media>,
}

/// One page of a user's timeline, newest first.
#[derive(Debug, Clone, Default)]
pub struct TimelinePage {
    pub tweets: Vec<Tweet>,
    pub media: Vec<Media>,
}

impl TimelinePage {
    /// Media objects attached to `tweet`, in attachment order.
    pub fn media_for(&self, tweet: &Tweet) -> Vec<Media> {
        resolve_media(tweet, &self.media)
    }
}

/// A single tweet together with its expanded media.
#[derive(Debug, Clone)]
pub struct TweetWithMedia {
    pub tweet: Tweet,
    pub media: Vec<Media>,
}

/// A tweet as returned by the v2 API.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub referenced_tweets: Vec<ReferencedTweet>,
    pub attachments: Option<Attachments>,
    pub entities: Option<Entities>,
}

impl Tweet {
    /// True when this tweet is a plain retweet of another tweet.
    pub fn is_retweet(&self) -> bool {
        self.references("retweeted")
    }

    /// True when this tweet quotes another tweet.
    pub fn is_quote(&self) -> bool {
        self.references("quoted")
    }

    fn references(&self, kind: &str) -> bool {
        self.referenced_tweets.iter().any(|r| r.kind == kind)
    }

    pub fn media_keys(&self) -> &[String] {
        self.attachments
            .as_ref()
            .map(|a| a.media_keys.as_slice())
            .unwrap_or_default()
    }

    /// The t.co link embedded in the text for the given media key, if any.
    pub fn short_link_for(&self, media_key: &str) -> Option<&str> {
        self.entities
            .as_ref()?
            .urls
            .iter()
            .find(|u| u.media_key.as_deref() == Some(media_key))
            .map(|u| u.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferencedTweet {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachments {
    #[serde(default)]
    pub media_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

/// A shortened link inside the tweet text.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlEntity {
    pub url: String,
    pub expanded_url: Option<String>,
    pub media_key: Option<String>,
}

/// An expanded media object.
#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    pub media_key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Option<String>,
    pub preview_image_url: Option<String>,
    pub alt_text: Option<String>,
}

impl Media {
    /// Direct URL for photos, preview image for videos and gifs.
    pub fn best_url(&self) -> Option<&str> {
        self.url.as_deref().or(self.preview_image_url.as_deref())
    }
}

pub(crate) fn resolve_media(tweet: &Tweet, media: &[Media]) -> Vec<Media> {
    tweet
        .media_keys()
        .iter()
        .filter_map(|key| media.iter().find(|m| &m.media_key == key).cloned())
        .collect()
}
