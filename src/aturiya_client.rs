use crate::errors::{AppError, ResultExt};
use crate::models::{Campaign, ListEnvelope, Pagination, RawLead, UserInfo};
use std::time::Duration;

/// Leads requested per page when walking a campaign.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Client for the Aturiya SDR-agent API.
///
/// Every call carries the bearer token; campaigns and leads are scoped to
/// the configured user and SDR agent.
#[derive(Clone)]
pub struct AturiyaClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    user_id: String,
    agent_id: String,
}

impl AturiyaClient {
    pub fn new(
        base_url: String,
        token: String,
        user_id: String,
        agent_id: String,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Aturiya client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            user_id,
            agent_id,
        })
    }

    fn agent_url(&self, resource: &str) -> String {
        format!(
            "{}/users/{}/agents/sdr/{}/{}",
            self.base_url, self.user_id, self.agent_id, resource
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(AppError::from)
            .context("Aturiya request")?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AppError::Unauthorized(format!(
                "Aturiya rejected the bearer token ({})",
                status
            )));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Aturiya returned {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Aturiya response: {}", e))
        })
    }

    /// Verifies the bearer token and returns the authenticated user.
    pub async fn authenticate(&self) -> Result<UserInfo, AppError> {
        let url = format!("{}/users/auth/me", self.base_url);
        self.get_json(&url, &[]).await
    }

    /// Lists all campaigns of the configured SDR agent, in API order.
    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>, AppError> {
        let envelope: ListEnvelope<Campaign> =
            self.get_json(&self.agent_url("campaigns"), &[]).await?;
        Ok(envelope.data)
    }

    /// Fetches one page of leads for a campaign.
    pub async fn get_leads(
        &self,
        campaign_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<RawLead>, Pagination), AppError> {
        let envelope: ListEnvelope<RawLead> = self
            .get_json(
                &self.agent_url("leads"),
                &[
                    ("campaign_id", campaign_id.to_string()),
                    ("page", page.to_string()),
                    ("per_page", per_page.to_string()),
                ],
            )
            .await?;

        let pagination = envelope.pagination.unwrap_or_default();
        tracing::info!(
            "Fetched {} leads (page {}/{})",
            envelope.data.len(),
            pagination.page.unwrap_or(page),
            pagination.total_pages.unwrap_or(1)
        );
        Ok((envelope.data, pagination))
    }

    /// Fetches every page of a campaign, concatenated in page order.
    pub async fn get_all_leads(&self, campaign_id: &str) -> Result<Vec<RawLead>, AppError> {
        let mut all_leads = Vec::new();
        let mut page = 1;
        loop {
            let (leads, pagination) = self.get_leads(campaign_id, page, DEFAULT_PAGE_SIZE).await?;
            all_leads.extend(leads);
            if !pagination.has_next_page {
                break;
            }
            page += 1;
        }
        tracing::info!("Total leads fetched: {}", all_leads.len());
        Ok(all_leads)
    }
}
