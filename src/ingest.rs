use crate::aturiya_client::AturiyaClient;
use crate::errors::{AppError, ResultExt};
use crate::models::RawLead;

/// Ingests the leads of one campaign.
///
/// Without a `campaign_id` the first campaign of the agent is used. Any
/// failure here is fatal for a pipeline run.
pub async fn fetch_leads(
    client: &AturiyaClient,
    campaign_id: Option<&str>,
) -> Result<Vec<RawLead>, AppError> {
    let user = client.authenticate().await.context("Aturiya authentication")?;
    tracing::info!(
        "Authenticated as {} ({})",
        user.full_name.as_deref().unwrap_or("?"),
        user.email.as_deref().unwrap_or("?")
    );

    let campaign_id = match campaign_id {
        Some(id) => id.to_string(),
        None => {
            let campaigns = client.list_campaigns().await.context("Listing campaigns")?;
            let first = campaigns.into_iter().next().ok_or_else(|| {
                AppError::Ingestion(
                    "No campaigns found. Create a campaign in Aturiya first.".to_string(),
                )
            })?;
            tracing::info!(
                "Using campaign: {} ({})",
                first.name.as_deref().unwrap_or("unnamed"),
                first.id
            );
            first.id
        }
    };

    let leads = client
        .get_all_leads(&campaign_id)
        .await
        .with_context(|| format!("Fetching leads of campaign {}", campaign_id))?;

    if leads.is_empty() {
        return Err(AppError::Ingestion(format!(
            "No leads found in campaign {}",
            campaign_id
        )));
    }

    tracing::info!(
        "Ingested {} raw leads from campaign {}",
        leads.len(),
        campaign_id
    );

    Ok(leads)
}
