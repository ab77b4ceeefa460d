use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use clap::{ArgGroup, CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use finder_common::Config;
use prompt_api_client::PromptApiClient;
use prompt_finder::{
    manual, schedule,
    traits::{PromptStore, Timeline},
    ArchiveRotation, HashtagMatcher, PromptFinder, SearchPolicy,
};
use twitter_client::TwitterClient;

#[derive(Parser)]
#[command(name = "finder", about = "Find and record the daily prompt")]
#[command(group(
    ArgGroup::new("mode")
        .args(["archive", "fetch", "manual", "schedule"])
        .multiple(false)
))]
struct Cli {
    /// Kick off archive generation and prune old archive files
    #[arg(short, long)]
    archive: bool,

    /// Attempt to record the latest prompt right now
    #[arg(short, long)]
    fetch: bool,

    /// Manually record a specific prompt post
    #[arg(short, long)]
    manual: bool,

    /// Record the latest prompt on the schedule stored in the backend
    #[arg(short, long)]
    schedule: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("prompt_finder=info".parse()?)
                .add_directive("finder=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    if !(cli.archive || cli.fetch || cli.manual || cli.schedule) {
        Cli::command().print_help()?;
        return Ok(());
    }

    // Load config
    let config = Config::from_env()?;
    config.log_redacted();

    let store: Arc<dyn PromptStore> = Arc::new(PromptApiClient::new(
        config.api_url.clone(),
        config.api_token.clone(),
    ));
    let timeline: Arc<dyn Timeline> = Arc::new(TwitterClient::with_base_url(
        config.twitter_api_url.clone(),
        config.twitter_bearer_token.clone(),
    ));
    let finder = Arc::new(
        PromptFinder::new(store.clone(), timeline, Arc::new(HashtagMatcher::default()))
            .with_policy(SearchPolicy::from_config(&config)),
    );
    let rotation = Arc::new(ArchiveRotation::new(
        store.clone(),
        config.downloads_path.clone(),
        &config.archive_extension,
    ));

    let today = Local::now().date_naive();

    if cli.fetch {
        info!(%today, "Running fetch");
        let outcome = finder.run(today).await?;
        info!(%outcome, "Fetch complete");
    } else if cli.manual {
        let (post_id, date) =
            tokio::task::spawn_blocking(move || manual::ask_for_prompt(today)).await??;
        let outcome = finder.record_manual(&post_id, date).await?;
        info!(%outcome, "Manual recording complete");
    } else if cli.archive {
        info!("Running archive");
        let created = rotation.rotate().await?;
        info!(created, "Archive complete");
    } else if cli.schedule {
        info!("Starting scheduler");
        let mut scheduler = schedule::start_scheduler(store, finder, rotation).await?;
        tokio::signal::ctrl_c().await?;
        info!("Shutting down scheduler");
        scheduler.shutdown().await?;
    }

    Ok(())
}
