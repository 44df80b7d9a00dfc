use crate::enrichment::EnrichmentVendor;
use crate::errors::{AppError, ResultExt};
use crate::pipe0_models::{RunStarted, VendorRequest, VendorResponse};
use std::future::Future;
use std::time::{Duration, Instant};

/// Default bound for [`Pipe0Client::wait_for_run`].
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(120);
/// Default pause between two status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Client for the pipe0 enrichment API.
///
/// Built once at startup and handed to whoever needs it.
#[derive(Clone)]
pub struct Pipe0Client {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Pipe0Client {
    /// Creates a new `Pipe0Client`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the pipe0 API.
    /// * `api_key` - Bearer credential for every call.
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create pipe0 client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "pipe0 {} returned {}: {}",
                what, status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse pipe0 {} response: {}", what, e))
        })
    }

    /// Runs enrichment synchronously for one batch (at most 9 records).
    ///
    /// Vendor-reported errors inside a successful response are logged, not
    /// returned; the records that did resolve are still usable.
    pub async fn enrich_sync(&self, request: &VendorRequest) -> Result<VendorResponse, AppError> {
        let url = format!("{}/v1/pipes/run/sync", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(AppError::from)
            .context("pipe0 sync run")?;

        let data: VendorResponse = Self::read_json(response, "sync run").await?;

        if let Some(errors) = data.reported_errors() {
            tracing::warn!("pipe0 returned errors: {}", errors);
        }

        tracing::info!(
            "pipe0 sync run {} - status: {}",
            data.run_id.as_deref().unwrap_or("?"),
            data.status.as_deref().unwrap_or("?")
        );
        Ok(data)
    }

    /// Starts an async run and returns its run id.
    pub async fn enrich_async(&self, request: &VendorRequest) -> Result<String, AppError> {
        let url = format!("{}/v1/pipes/run", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(AppError::from)
            .context("pipe0 async run")?;

        let started: RunStarted = Self::read_json(response, "async run").await?;
        let run_id = started
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::ExternalApiError("pipe0 run response missing 'id'".into()))?;

        tracing::info!("pipe0 async run started: {}", run_id);
        Ok(run_id)
    }

    /// Current status snapshot of a run.
    pub async fn check_run(&self, run_id: &str) -> Result<VendorResponse, AppError> {
        let url = format!("{}/v1/pipes/check/{}", self.base_url, run_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(AppError::from)
            .context("pipe0 check")?;

        Self::read_json(response, "check").await
    }

    /// Polls a run until it is `completed` or `failed`.
    ///
    /// Fails with [`AppError::Timeout`] once `timeout` has elapsed without a
    /// terminal status.
    pub async fn wait_for_run(
        &self,
        run_id: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<VendorResponse, AppError> {
        let start = Instant::now();

        while start.elapsed() < timeout {
            let snapshot = self.check_run(run_id).await?;
            let status = snapshot.run_status();
            if status.is_terminal() {
                return Ok(snapshot);
            }
            tracing::debug!("Run {} still {:?}, waiting...", run_id, status);
            tokio::time::sleep(interval).await;
        }

        Err(AppError::Timeout(format!(
            "pipe0 run {} did not complete within {}s",
            run_id,
            timeout.as_secs()
        )))
    }

    /// Starts an async run and polls it with the default timeout and
    /// interval.
    pub async fn run_to_completion(
        &self,
        request: &VendorRequest,
    ) -> Result<VendorResponse, AppError> {
        let run_id = self.enrich_async(request).await?;
        self.wait_for_run(&run_id, DEFAULT_RUN_TIMEOUT, DEFAULT_POLL_INTERVAL)
            .await
    }
}

impl EnrichmentVendor for Pipe0Client {
    fn enrich_sync(
        &self,
        request: &VendorRequest,
    ) -> impl Future<Output = Result<VendorResponse, AppError>> + Send {
        Pipe0Client::enrich_sync(self, request)
    }
}
