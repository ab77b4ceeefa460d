use anyhow::Result;
use chrono::NaiveDate;
use dialoguer::Input;
use tracing::info;

use crate::discovery::PromptFinder;
use crate::types::RunOutcome;

impl PromptFinder {
    /// Record `post_id` as the prompt for `date`, skipping host resolution,
    /// search and the already-recorded check. The operator picked the post.
    pub async fn record_manual(&self, post_id: &str, date: NaiveDate) -> Result<RunOutcome> {
        let post = self.timeline().post(post_id).await?;
        info!(post_id, %date, "Manually recording prompt");

        match self.build_discovery(&post, date) {
            Ok(discovery) => Ok(self.record(discovery).await),
            Err(reason) => {
                info!(%reason, "Aborting");
                Ok(RunOutcome::Aborted(reason))
            }
        }
    }
}

/// Ask the operator which post to record and for which day.
pub fn ask_for_prompt(today: NaiveDate) -> Result<(String, NaiveDate)> {
    let post_id: String = Input::new()
        .with_prompt("Prompt post id")
        .validate_with(|input: &String| -> Result<(), &'static str> {
            if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
                Ok(())
            } else {
                Err("post ids are numeric")
            }
        })
        .interact_text()?;

    let date: String = Input::new()
        .with_prompt("Prompt date (YYYY-MM-DD)")
        .default(today.format("%Y-%m-%d").to_string())
        .validate_with(|input: &String| -> Result<(), &'static str> {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| "expected YYYY-MM-DD")
        })
        .interact_text()?;

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")?;
    Ok((post_id.trim().to_string(), date))
}
