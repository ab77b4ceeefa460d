use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

use finder_common::Discovery;

/// Why a run ended without recording a prompt.
///
/// These are expected outcomes, not faults: the scheduler simply runs again later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    #[error("prompt for {date} already recorded")]
    AlreadyRecordedToday { date: NaiveDate },

    #[error("search limit reached without finding a prompt from host {host_id}")]
    NotFound { host_id: String },

    #[error("cannot find the prompt word in post {post_id}")]
    WordExtractionFailed { post_id: String },

    #[error("cannot resolve the host for {date}: {reason}")]
    HostResolutionFailed { date: NaiveDate, reason: String },

    #[error("cannot add prompt for {date} to the store: {reason}")]
    PersistenceFailed { date: NaiveDate, reason: String },

    #[error("cannot generate the archive: {reason}")]
    ArchiveGenerationFailed { reason: String },
}

/// Result of a single discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Recorded(Discovery),
    Aborted(AbortReason),
}

impl RunOutcome {
    pub fn into_result(self) -> Result<Discovery, AbortReason> {
        match self {
            Self::Recorded(discovery) => Ok(discovery),
            Self::Aborted(reason) => Err(reason),
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded(d) => write!(f, "recorded {} for {} (post {})", d.word, d.date, d.post_id),
            Self::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}
