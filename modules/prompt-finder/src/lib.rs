pub mod archive;
pub mod discovery;
pub mod hosts;
pub mod manual;
pub mod matcher;
pub mod reconcile;
pub mod schedule;
pub mod search;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use archive::ArchiveRotation;
pub use discovery::PromptFinder;
pub use hosts::{HostResolver, HostRule};
pub use matcher::{ContentMatcher, HashtagMatcher};
pub use reconcile::{DateReconciler, DayOffsetHeuristic};
pub use search::{SearchPolicy, TimelineSearch};
pub use types::{AbortReason, RunOutcome};
