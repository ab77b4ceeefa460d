use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::error::FinderError;

const DEFAULT_TWITTER_API_URL: &str = "https://api.twitter.com/2";
const DEFAULT_DOWNLOADS_PATH: &str = "./downloads";
const DEFAULT_ARCHIVE_EXTENSION: &str = "xlsx";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_MAX_DEPTH: u32 = 7;

/// Page sizes the timeline provider honours as asked.
const PAGE_SIZE_RANGE: std::ops::RangeInclusive<u32> = 5..=100;
const MAX_SEARCH_DEPTH: u32 = 50;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Backend store
    pub api_url: String,
    pub api_token: String,

    // Social timeline
    pub twitter_api_url: String,
    pub twitter_bearer_token: String,

    // Archive snapshots
    pub downloads_path: PathBuf,
    pub archive_extension: String,

    // Timeline search horizon
    pub search_page_size: u32,
    pub search_max_depth: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, FinderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FinderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| FinderError::Config(format!("{key} environment variable is required")))
        };
        let number = |key: &str, default: u32| -> Result<u32, FinderError> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| FinderError::Config(format!("{key} must be a number, got {raw:?}"))),
                None => Ok(default),
            }
        };

        let search_page_size = number("SEARCH_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !PAGE_SIZE_RANGE.contains(&search_page_size) {
            return Err(FinderError::Config(format!(
                "SEARCH_PAGE_SIZE must be between {} and {}, got {search_page_size}",
                PAGE_SIZE_RANGE.start(),
                PAGE_SIZE_RANGE.end()
            )));
        }
        let search_max_depth = number("SEARCH_MAX_DEPTH", DEFAULT_MAX_DEPTH)?;
        if search_max_depth > MAX_SEARCH_DEPTH {
            return Err(FinderError::Config(format!(
                "SEARCH_MAX_DEPTH must be at most {MAX_SEARCH_DEPTH}, got {search_max_depth}"
            )));
        }

        Ok(Self {
            api_url: required("API_URL")?,
            api_token: required("API_TOKEN")?,
            twitter_api_url: lookup("TWITTER_API_URL")
                .unwrap_or_else(|| DEFAULT_TWITTER_API_URL.to_string()),
            twitter_bearer_token: required("TWITTER_BEARER_TOKEN")?,
            downloads_path: PathBuf::from(
                lookup("DOWNLOADS_PATH").unwrap_or_else(|| DEFAULT_DOWNLOADS_PATH.to_string()),
            ),
            archive_extension: lookup("ARCHIVE_EXTENSION")
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or_else(|| DEFAULT_ARCHIVE_EXTENSION.to_string()),
            search_page_size,
            search_max_depth,
        })
    }

    /// Log every setting with secrets masked.
    pub fn log_redacted(&self) {
        info!(
            api_url = self.api_url.as_str(),
            api_token = redact(&self.api_token).as_str(),
            twitter_api_url = self.twitter_api_url.as_str(),
            twitter_bearer_token = redact(&self.twitter_bearer_token).as_str(),
            downloads_path = %self.downloads_path.display(),
            archive_extension = self.archive_extension.as_str(),
            search_page_size = self.search_page_size,
            search_max_depth = self.search_max_depth,
            "Loaded config"
        );
    }
}

fn redact(secret: &str) -> String {
    if secret.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{tail}")
}
