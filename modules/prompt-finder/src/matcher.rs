use std::sync::LazyLock;

use regex::Regex;

use finder_common::{CandidatePost, MediaDescriptor};

static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());
static CUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bprompt\b").unwrap());

/// Community tag every prompt post carries.
pub const DEFAULT_COMMUNITY_TAG: &str = "vss365";

/// Hashtags that decorate prompt posts but are never the prompt itself.
const META_TAGS: &[&str] = &[
    "vss365",
    "vss",
    "vssprompt",
    "vss365prompt",
    "vssfamily",
    "prompt",
    "writingprompt",
    "writingprompts",
    "amwriting",
    "writingcommunity",
    "writerslift",
    "flashfiction",
    "microfiction",
    "microfic",
    "shortstory",
    "poetry",
    "poetrycommunity",
];

/// Decides whether a post is the daily prompt and pulls the prompt word out of it.
pub trait ContentMatcher: Send + Sync {
    fn is_prompt_post(&self, text: &str) -> bool;

    fn extract_prompt_word(&self, text: &str) -> Option<String>;
}

/// Hashtag-based matcher: a prompt post carries the community tag plus the
/// word "prompt", and the prompt word is the first hashtag that is not
/// community decoration.
#[derive(Debug, Clone)]
pub struct HashtagMatcher {
    community_tag: String,
}

impl HashtagMatcher {
    pub fn new(community_tag: &str) -> Self {
        Self {
            community_tag: community_tag.trim_start_matches('#').to_lowercase(),
        }
    }

    fn has_community_tag(&self, text: &str) -> bool {
        HASHTAG_RE
            .captures_iter(text)
            .any(|c| c[1].to_lowercase() == self.community_tag)
    }
}

impl Default for HashtagMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_COMMUNITY_TAG)
    }
}

impl ContentMatcher for HashtagMatcher {
    fn is_prompt_post(&self, text: &str) -> bool {
        self.has_community_tag(text) && CUE_RE.is_match(text)
    }

    fn extract_prompt_word(&self, text: &str) -> Option<String> {
        HASHTAG_RE
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .find(|tag| {
                let lower = tag.to_lowercase();
                lower != self.community_tag && !META_TAGS.contains(&lower.as_str())
            })
    }
}

/// The first photo attached to the post, if any.
pub fn primary_media(post: &CandidatePost) -> Option<MediaDescriptor> {
    post.media
        .iter()
        .filter(|m| m.is_photo())
        .find_map(|m| {
            Some(MediaDescriptor {
                url: m.url.clone()?,
                alt_text: m.alt_text.clone(),
            })
        })
}

/// Post text with the short links pointing at attached media removed.
pub fn post_text(post: &CandidatePost) -> String {
    let mut text = post.text.clone();
    for link in post.media.iter().filter_map(|m| m.short_link.as_deref()) {
        text = text.replace(link, "");
    }
    text.trim().to_string()
}

/// Escape text for storage in HTML-rendered pages.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
