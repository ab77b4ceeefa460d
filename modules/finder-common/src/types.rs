use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates;

// --- Store records ---

/// An account that hosts the prompt for some period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, deserialize_with = "dates::deserialize_option")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "dates::deserialize_option")]
    pub valid_to: Option<NaiveDate>,
}

/// The most recently persisted prompt. Only its date is relied on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LatestRecord {
    #[serde(deserialize_with = "dates::deserialize")]
    pub date: NaiveDate,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub word: Option<String>,
}

// --- Timeline posts ---

/// A post pulled from a host's timeline while searching.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePost {
    pub id: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub is_repost: bool,
    pub is_quote_repost: bool,
    pub media: Vec<MediaAttachment>,
}

impl CandidatePost {
    /// Original posts are neither reposts nor quote-reposts.
    pub fn is_original(&self) -> bool {
        !self.is_repost && !self.is_quote_repost
    }
}

/// A media object attached to a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    /// Provider media kind: `photo`, `video`, `animated_gif`.
    pub kind: String,
    pub url: Option<String>,
    pub alt_text: Option<String>,
    /// Shortened link in the post text that points at this media.
    pub short_link: Option<String>,
}

impl MediaAttachment {
    pub fn is_photo(&self) -> bool {
        self.kind == "photo"
    }
}

// --- Discovery ---

/// Media stored alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaDescriptor {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A found prompt ready to be persisted. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovery {
    #[serde(rename = "id")]
    pub post_id: String,
    #[serde(rename = "uid")]
    pub author_id: String,
    pub date: NaiveDate,
    pub word: String,
    pub content: String,
    pub media: Option<MediaDescriptor>,
}

/// Iteration state of one timeline search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursor {
    pub host_id: String,
    pub before_post_id: Option<String>,
    pub depth: u32,
}

impl SearchCursor {
    pub fn start(host_id: &str) -> Self {
        Self {
            host_id: host_id.to_string(),
            before_post_id: None,
            depth: 0,
        }
    }

    /// Move the cursor past `oldest_id` and go one page deeper.
    pub fn advance(&mut self, oldest_id: &str) {
        self.before_post_id = Some(oldest_id.to_string());
        self.depth += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn discovery_serializes_to_store_shape() {
        let discovery = Discovery {
            post_id: "1350".to_string(),
            author_id: "42".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 1, 16).unwrap(),
            word: "Lantern".to_string(),
            content: "#vss365 prompt: #Lantern".to_string(),
            media: None,
        };

        let value = serde_json::to_value(&discovery).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1350",
                "uid": "42",
                "date": "2021-01-16",
                "word": "Lantern",
                "content": "#vss365 prompt: #Lantern",
                "media": null,
            })
        );
    }

    #[test]
    fn latest_record_accepts_http_dates() {
        let record: LatestRecord = serde_json::from_value(json!({
            "id": "1350",
            "date": "Sat, 16 Jan 2021 00:00:00 GMT",
            "word": "Lantern",
        }))
        .unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2021, 1, 16).unwrap());
    }

    #[test]
    fn host_validity_fields_are_optional() {
        let host: Host = serde_json::from_value(json!({"id": "42", "handle": "writer"})).unwrap();
        assert_eq!(host.id, "42");
        assert_eq!(host.valid_from, None);
    }

    #[test]
    fn reposts_are_not_original() {
        let mut post = CandidatePost {
            id: "1".to_string(),
            author_id: "42".to_string(),
            created_at: Utc::now(),
            text: String::new(),
            is_repost: false,
            is_quote_repost: false,
            media: vec![],
        };
        assert!(post.is_original());
        post.is_quote_repost = true;
        assert!(!post.is_original());
    }
}
