//! Chain tests: full discovery runs against mocks.
//!
//! Each test follows MOCK → RUN → OUTPUT: set up the store and the host's
//! timeline, run the real finder for a fixed "today", and assert on the
//! outcome plus what reached the store.

use std::sync::Arc;

use chrono::NaiveDate;
use finder_common::MediaDescriptor;
use prompt_finder::testing::*;
use prompt_finder::{AbortReason, HashtagMatcher, PromptFinder, RunOutcome};

fn finder(store: &Arc<MockStore>, timeline: &Arc<MockTimeline>) -> PromptFinder {
    PromptFinder::new(
        store.clone(),
        timeline.clone(),
        Arc::new(HashtagMatcher::default()),
    )
}

fn aborted(outcome: RunOutcome) -> AbortReason {
    outcome.into_result().expect_err("run should have aborted")
}

/// Host timeline: some chatter, then the prompt (with a photo) posted at
/// 06:00 UTC on `day`.
fn prompt_day(day: NaiveDate) -> Vec<finder_common::CandidatePost> {
    let at = day.and_hms_opt(6, 0, 0).unwrap().and_utc();
    let mut posts = chatter("chat", 3, at + chrono::Duration::hours(6));
    posts.push(with_photo(
        post("prompt-1", at, "#vss365 prompt: #Lantern <3"),
        "https://pbs.twimg.com/media/lantern.jpg",
        "https://t.co/lantern",
    ));
    posts
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn records_prompt_and_broadcasts() {
    let today = date(2021, 1, 16);
    let store = Arc::new(
        MockStore::new()
            .with_latest(date(2021, 1, 15))
            .on_host(date(2021, 1, 16), HOST_ID),
    );
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let discovery = finder(&store, &timeline)
        .run(today)
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(discovery.post_id, "prompt-1");
    assert_eq!(discovery.author_id, HOST_ID);
    assert_eq!(discovery.date, today);
    assert_eq!(discovery.word, "Lantern");
    assert_eq!(discovery.content, "#vss365 prompt: #Lantern &lt;3");
    assert_eq!(
        discovery.media,
        Some(MediaDescriptor {
            url: "https://pbs.twimg.com/media/lantern.jpg".to_string(),
            alt_text: None,
        })
    );

    assert_eq!(store.created(), vec![discovery]);
    assert_eq!(store.broadcasts(), vec![today]);
    assert_eq!(store.host_lookups(), vec![date(2021, 1, 16)]);
}

#[tokio::test]
async fn empty_store_does_not_block_the_first_run() {
    let today = date(2021, 3, 2);
    let store = Arc::new(MockStore::new().on_host(date(2021, 3, 1), HOST_ID));
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(outcome.is_recorded());
}

#[tokio::test]
async fn late_utc_post_is_recorded_for_local_today() {
    let today = date(2021, 1, 6);
    let store = Arc::new(
        MockStore::new()
            .with_latest(date(2021, 1, 5))
            .on_host(date(2021, 1, 1), HOST_ID),
    );
    let timeline = Arc::new(MockTimeline::new().on_timeline(
        HOST_ID,
        vec![post("late", utc(2021, 1, 5, 23, 0), PROMPT_TEXT)],
    ));

    let discovery = finder(&store, &timeline)
        .run(today)
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(discovery.date, today);
    assert_eq!(store.broadcasts(), vec![today]);
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn already_recorded_today_skips_everything() {
    let today = date(2021, 1, 16);
    let store = Arc::new(
        MockStore::new()
            .with_latest(today)
            .on_host(date(2021, 1, 16), HOST_ID),
    );
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert_eq!(aborted(outcome), AbortReason::AlreadyRecordedToday { date: today });
    assert_eq!(store.calls(), vec![StoreCall::LatestRecord]);
    assert_eq!(timeline.fetch_count(), 0);
}

#[tokio::test]
async fn second_run_is_a_noop_without_searching() {
    let today = date(2021, 1, 16);
    let store = Arc::new(
        MockStore::new()
            .with_latest(date(2021, 1, 15))
            .on_host(date(2021, 1, 16), HOST_ID),
    );
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));
    let finder = finder(&store, &timeline);

    let first = finder.run(today).await.unwrap();
    assert!(first.is_recorded());
    let fetches_after_first = timeline.fetch_count();

    let second = finder.run(today).await.unwrap();

    assert_eq!(aborted(second), AbortReason::AlreadyRecordedToday { date: today });
    assert_eq!(timeline.fetch_count(), fetches_after_first);
    assert_eq!(store.created().len(), 1);
    assert_eq!(store.broadcasts().len(), 1);
}

#[tokio::test]
async fn newest_prompt_already_recorded_yesterday_is_not_duplicated() {
    // Local day has rolled over to Feb 1 but the host has not posted yet;
    // the newest prompt is Jan 31's, which is already stored.
    let today = date(2021, 2, 1);
    let store = Arc::new(
        MockStore::new()
            .with_latest(date(2021, 1, 31))
            .on_host(date(2021, 2, 1), HOST_ID),
    );
    let timeline = Arc::new(MockTimeline::new().on_timeline(
        HOST_ID,
        vec![post("jan-31", utc(2021, 1, 31, 14, 0), PROMPT_TEXT)],
    ));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert_eq!(
        aborted(outcome),
        AbortReason::AlreadyRecordedToday {
            date: date(2021, 1, 31)
        }
    );
    assert!(store.created().is_empty());
    assert!(store.broadcasts().is_empty());
}

// ---------------------------------------------------------------------------
// Host resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn biweekly_host_is_looked_up_by_period_start() {
    let today = date(2021, 2, 20);
    let store = Arc::new(MockStore::new().on_host(date(2021, 2, 15), HOST_ID));
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(outcome.is_recorded());
    assert_eq!(store.host_lookups(), vec![date(2021, 2, 15)]);
}

#[tokio::test]
async fn missing_biweekly_host_aborts_before_searching() {
    let today = date(2021, 4, 3);
    let store = Arc::new(MockStore::new());
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(matches!(
        aborted(outcome),
        AbortReason::HostResolutionFailed { date, .. } if date == today
    ));
    assert_eq!(store.host_lookups(), vec![date(2021, 4, 1)]);
    assert_eq!(timeline.fetch_count(), 0);
}

#[tokio::test]
async fn legacy_day_host_is_used_without_fallback() {
    let today = date(2020, 7, 23);
    let store = Arc::new(MockStore::new().on_host(today, HOST_ID));
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(outcome.is_recorded());
    assert_eq!(store.host_lookups(), vec![today]);
}

#[tokio::test]
async fn legacy_falls_back_to_month_host() {
    let today = date(2020, 7, 23);
    let store = Arc::new(MockStore::new().on_host(date(2020, 7, 1), HOST_ID));
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(outcome.is_recorded());
    assert_eq!(store.host_lookups(), vec![today, date(2020, 7, 1)]);
}

#[tokio::test]
async fn legacy_falls_back_when_day_lookup_errors() {
    let today = date(2020, 7, 23);
    let store = Arc::new(
        MockStore::new()
            .failing_host(today, 500)
            .on_host(date(2020, 7, 1), HOST_ID),
    );
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(outcome.is_recorded());
    assert_eq!(store.host_lookups(), vec![today, date(2020, 7, 1)]);
}

#[tokio::test]
async fn legacy_without_month_host_fails() {
    let today = date(2020, 7, 23);
    let store = Arc::new(MockStore::new());
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(matches!(
        aborted(outcome),
        AbortReason::HostResolutionFailed { .. }
    ));
    assert_eq!(store.host_lookups(), vec![today, date(2020, 7, 1)]);
    assert_eq!(timeline.fetch_count(), 0);
}

// ---------------------------------------------------------------------------
// Search and extraction failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prompt_outside_horizon_is_not_found() {
    let today = date(2021, 1, 16);
    let store = Arc::new(MockStore::new().on_host(date(2021, 1, 16), HOST_ID));
    let timeline = Arc::new(
        MockTimeline::new().on_timeline(HOST_ID, chatter("chat", 400, utc(2021, 1, 16, 12, 0))),
    );

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert_eq!(
        aborted(outcome),
        AbortReason::NotFound {
            host_id: HOST_ID.to_string()
        }
    );
    assert_eq!(timeline.fetch_count(), 8);
    assert!(store.created().is_empty());
}

#[tokio::test]
async fn word_extraction_failure_cites_post_and_persists_nothing() {
    let today = date(2021, 1, 16);
    let store = Arc::new(MockStore::new().on_host(date(2021, 1, 16), HOST_ID));
    let timeline = Arc::new(MockTimeline::new().on_timeline(
        HOST_ID,
        vec![post(
            "wordless",
            utc(2021, 1, 16, 6, 0),
            "#vss365 prompt coming later today #amwriting",
        )],
    ));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert_eq!(
        aborted(outcome),
        AbortReason::WordExtractionFailed {
            post_id: "wordless".to_string()
        }
    );
    assert!(store.created().is_empty());
    assert!(store.broadcasts().is_empty());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn persistence_failure_is_reported_without_broadcast() {
    let today = date(2021, 1, 16);
    let store = Arc::new(
        MockStore::new()
            .on_host(date(2021, 1, 16), HOST_ID)
            .failing_create(),
    );
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(matches!(
        aborted(outcome),
        AbortReason::PersistenceFailed { date, .. } if date == today
    ));
    assert!(store.broadcasts().is_empty());
    // No retry within the run.
    let creates = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::CreatePrompt(_)))
        .count();
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn broadcast_failure_still_counts_as_recorded() {
    let today = date(2021, 1, 16);
    let store = Arc::new(
        MockStore::new()
            .on_host(date(2021, 1, 16), HOST_ID)
            .failing_broadcast(),
    );
    let timeline = Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(today)));

    let outcome = finder(&store, &timeline).run(today).await.unwrap();

    assert!(outcome.is_recorded());
    assert_eq!(store.created().len(), 1);
}

// ---------------------------------------------------------------------------
// Manual recording
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manual_recording_uses_the_given_date() {
    let store = Arc::new(MockStore::new().with_latest(date(2021, 1, 16)));
    let timeline =
        Arc::new(MockTimeline::new().on_timeline(HOST_ID, prompt_day(date(2021, 1, 16))));

    let discovery = finder(&store, &timeline)
        .record_manual("prompt-1", date(2021, 1, 14))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(discovery.date, date(2021, 1, 14));
    assert_eq!(discovery.word, "Lantern");
    assert_eq!(store.host_lookups(), Vec::<NaiveDate>::new());
    assert_eq!(store.broadcasts(), vec![date(2021, 1, 14)]);
}

#[tokio::test]
async fn manual_recording_of_wordless_post_aborts() {
    let store = Arc::new(MockStore::new());
    let timeline = Arc::new(MockTimeline::new().on_timeline(
        HOST_ID,
        vec![post("chat", utc(2021, 1, 16, 6, 0), "Good morning!")],
    ));

    let outcome = finder(&store, &timeline)
        .record_manual("chat", date(2021, 1, 16))
        .await
        .unwrap();

    assert_eq!(
        aborted(outcome),
        AbortReason::WordExtractionFailed {
            post_id: "chat".to_string()
        }
    );
    assert!(store.created().is_empty());
}
