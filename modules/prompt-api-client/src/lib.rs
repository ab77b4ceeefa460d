pub mod error;

pub use error::{ApiError, Result};

use chrono::NaiveDate;
use finder_common::{Discovery, Host, LatestRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Client for the prompt archive backend.
///
/// Resources are addressed as `{base}/{resource}[/{filter_key}]`. Every
/// non-success status becomes [`ApiError::Api`].
pub struct PromptApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl PromptApiClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, resource: &str, filter_key: Option<&str>) -> String {
        match filter_key {
            Some(key) => format!("{}/{}/{}", self.base_url, resource, key),
            None => format!("{}/{}", self.base_url, resource),
        }
    }

    /// `GET {resource}[/{filter_key}]?params` decoded as `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        filter_key: Option<&str>,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(resource, filter_key);
        tracing::debug!(url = url.as_str(), "GET");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await?;

        let body = Self::check(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST {resource}?params` with an optional JSON payload. The response body is ignored.
    pub async fn post<P: Serialize + ?Sized>(
        &self,
        resource: &str,
        payload: Option<&P>,
        params: &[(&str, String)],
    ) -> Result<()> {
        let url = self.url(resource, None);
        tracing::debug!(url = url.as_str(), "POST");

        let mut req = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .query(params);
        if let Some(payload) = payload {
            req = req.json(payload);
        }

        Self::check(req.send().await?).await?;
        Ok(())
    }

    async fn check(resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp.text().await?)
    }

    /// The most recently recorded prompt, or `None` when nothing is recorded yet.
    pub async fn latest_record(&self) -> Result<Option<LatestRecord>> {
        let records: Vec<LatestRecord> = self.get("prompt", None, &[]).await?;
        Ok(records.into_iter().next())
    }

    /// Hosts scoped to `date`.
    pub async fn hosts_on(&self, date: NaiveDate) -> Result<Vec<Host>> {
        self.get("host", Some("date"), &[("date", date_param(date))])
            .await
    }

    pub async fn create_prompt(&self, discovery: &Discovery) -> Result<()> {
        self.post("prompt", Some(discovery), &[]).await
    }

    /// Ask the backend to send out the notification for `date`.
    pub async fn broadcast(&self, date: NaiveDate) -> Result<()> {
        self.post::<()>("broadcast", None, &[("date", date_param(date))])
            .await
    }

    /// Ask the backend to regenerate the archive snapshot.
    pub async fn generate_archive(&self) -> Result<()> {
        self.post::<()>("archive", None, &[]).await
    }

    /// Scheduled run times as `"MINUTE HOUR"` strings.
    pub async fn timings(&self) -> Result<Vec<String>> {
        self.get("settings", Some("timings"), &[]).await
    }
}

fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
